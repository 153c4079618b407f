// Concepts and template callables
//
// A concept is a named predicate over `(qualifier, type)`. Template callables
// constrain each parameter with a concept and resolve their return type from
// the concrete argument tuple when specialized.

use crate::arena::{DeclId, Module, TypeId};
use crate::decls::{Decl, DeclKind, Qualifier};
use crate::error::{AstError, AstResult};
use crate::types::{ArrayFlags, TypeKind};
use serde::{Deserialize, Serialize};

/// Type classes testable without naming concrete handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeClass {
    Value,
    Resource,
    Matrix,
    Buffer,
    ByteBuffer,
    StructuredBuffer,
    Sampler,
    Texture,
    Texture2D,
    Texture3D,
    RayQuery,
    Accel,
}

/// Predicate shape of a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConceptRule {
    /// Exactly one of the listed types
    AnyOf(Vec<TypeId>),
    /// Satisfied when any of the referenced concepts is satisfied
    Union(Vec<DeclId>),
    /// Membership in a structural type class
    Class(TypeClass),
    /// Structured buffer whose element is one of the listed types
    StructuredBufferOf(Vec<TypeId>),
    /// Group-shared array whose element is one of the listed types
    SharedArrayOf(Vec<TypeId>),
    /// 2D texture whose element is one of the listed types
    Texture2DOf(Vec<TypeId>),
    /// 3D texture whose element is one of the listed types
    Texture3DOf(Vec<TypeId>),
}

/// How a template resolves its return type from the argument tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnRule {
    Fixed(TypeId),
    /// The first argument's type
    FirstArg,
    /// Bool scalar/vector matching the first argument's dimensionality
    BoolVecMatchingDim,
    /// Element scalar of the vector argument at `arg`
    VectorElement { arg: usize },
    /// Element type of the structured buffer argument at `arg`
    BufferElement { arg: usize },
    /// Element type of the texture argument at `arg`
    TextureElement { arg: usize },
    /// 4-vector of the element of the texture argument at `arg`
    Vec4OfTextureElement { arg: usize },
}

impl Module {
    pub fn declare_concept(&mut self, name: &str, rule: ConceptRule) -> DeclId {
        self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Concept {
                name: name.to_string(),
                rule,
            },
        })
    }

    fn class_matches(&self, class: TypeClass, ty: TypeId) -> bool {
        let kind = &self.type_decl(ty).kind;
        match class {
            TypeClass::Value => self.is_value(ty),
            TypeClass::Resource => self.is_resource(ty),
            TypeClass::Matrix => matches!(kind, TypeKind::Matrix { .. }),
            TypeClass::Buffer => matches!(
                kind,
                TypeKind::StructuredBuffer { .. }
                    | TypeKind::ByteBuffer { .. }
                    | TypeKind::ConstantBuffer { .. }
            ),
            TypeClass::ByteBuffer => matches!(kind, TypeKind::ByteBuffer { .. }),
            TypeClass::StructuredBuffer => matches!(kind, TypeKind::StructuredBuffer { .. }),
            TypeClass::Sampler => matches!(kind, TypeKind::Sampler),
            TypeClass::Texture => {
                matches!(kind, TypeKind::Texture2D { .. } | TypeKind::Texture3D { .. })
            }
            TypeClass::Texture2D => matches!(kind, TypeKind::Texture2D { .. }),
            TypeClass::Texture3D => matches!(kind, TypeKind::Texture3D { .. }),
            TypeClass::RayQuery => matches!(kind, TypeKind::RayQuery { .. }),
            TypeClass::Accel => matches!(kind, TypeKind::Accel),
        }
    }

    /// Evaluate a concept against a candidate `(qualifier, type)` pair
    pub fn concept_accepts(&self, concept: DeclId, qualifier: Qualifier, ty: TypeId) -> bool {
        let rule = match &self.decl(concept).kind {
            DeclKind::Concept { rule, .. } => rule,
            _ => return false,
        };
        match rule {
            ConceptRule::AnyOf(types) => types.contains(&ty),
            ConceptRule::Union(concepts) => concepts
                .iter()
                .any(|&c| self.concept_accepts(c, qualifier, ty)),
            ConceptRule::Class(class) => self.class_matches(*class, ty),
            ConceptRule::StructuredBufferOf(elements) => match self.type_decl(ty).kind {
                TypeKind::StructuredBuffer { element, .. } => elements.contains(&element),
                _ => false,
            },
            ConceptRule::SharedArrayOf(elements) => match self.type_decl(ty).kind {
                TypeKind::Array { element, flags, .. } => {
                    flags.contains(ArrayFlags::SHARED) && elements.contains(&element)
                }
                _ => false,
            },
            ConceptRule::Texture2DOf(elements) => match self.type_decl(ty).kind {
                TypeKind::Texture2D { element, .. } => elements.contains(&element),
                _ => false,
            },
            ConceptRule::Texture3DOf(elements) => match self.type_decl(ty).kind {
                TypeKind::Texture3D { element, .. } => elements.contains(&element),
                _ => false,
            },
        }
    }

    pub fn declare_template_function(
        &mut self,
        name: &str,
        return_rule: ReturnRule,
        param_concepts: &[DeclId],
    ) -> DeclId {
        self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::TemplateCallable {
                name: name.to_string(),
                owner: None,
                return_rule,
                param_concepts: param_concepts.to_vec(),
            },
        })
    }

    pub fn declare_template_method(
        &mut self,
        owner: TypeId,
        name: &str,
        return_rule: ReturnRule,
        param_concepts: &[DeclId],
    ) -> DeclId {
        self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::TemplateCallable {
                name: name.to_string(),
                owner: Some(owner),
                return_rule,
                param_concepts: param_concepts.to_vec(),
            },
        })
    }

    fn resolve_return_type(
        &self,
        name: &str,
        rule: &ReturnRule,
        arg_types: &[TypeId],
    ) -> AstResult<TypeId> {
        fn null_return(name: &str) -> AstError {
            AstError::NullReturnType(name.to_string())
        }
        match rule {
            ReturnRule::Fixed(ty) => Ok(*ty),
            ReturnRule::FirstArg => arg_types.first().copied().ok_or_else(|| null_return(name)),
            ReturnRule::BoolVecMatchingDim => {
                let first = arg_types.first().copied().ok_or_else(|| null_return(name))?;
                Ok(self.bool_matching_dim(first))
            }
            ReturnRule::VectorElement { arg } => {
                let ty = arg_types.get(*arg).copied().ok_or_else(|| null_return(name))?;
                match self.type_decl(ty).kind {
                    TypeKind::Vector { element, .. } => Ok(element),
                    _ => Err(null_return(name)),
                }
            }
            ReturnRule::BufferElement { arg } => {
                let ty = arg_types.get(*arg).copied().ok_or_else(|| null_return(name))?;
                match self.type_decl(ty).kind {
                    TypeKind::StructuredBuffer { element, .. } => Ok(element),
                    _ => Err(null_return(name)),
                }
            }
            ReturnRule::TextureElement { arg } => {
                let ty = arg_types.get(*arg).copied().ok_or_else(|| null_return(name))?;
                match self.type_decl(ty).kind {
                    TypeKind::Texture2D { element, .. } | TypeKind::Texture3D { element, .. } => {
                        Ok(element)
                    }
                    _ => Err(null_return(name)),
                }
            }
            ReturnRule::Vec4OfTextureElement { arg } => {
                let ty = arg_types.get(*arg).copied().ok_or_else(|| null_return(name))?;
                let element = match self.type_decl(ty).kind {
                    TypeKind::Texture2D { element, .. } | TypeKind::Texture3D { element, .. } => {
                        element
                    }
                    _ => return Err(null_return(name)),
                };
                self.vector(element, 4).map_err(|_| null_return(name))
            }
        }
    }

    /// Validate an argument tuple against a template and materialize the
    /// specialized declaration.
    ///
    /// A `return_override` supplied at the call site replaces whatever the
    /// template's return rule would produce; `BYTE_BUFFER_READ`-style typed
    /// loads rely on this.
    fn specialize(
        &mut self,
        template: DeclId,
        arg_types: &[TypeId],
        qualifiers: &[Qualifier],
        return_override: Option<TypeId>,
    ) -> AstResult<(String, Option<TypeId>, TypeId, Vec<DeclId>)> {
        let (name, owner, return_rule, param_concepts) = match &self.decl(template).kind {
            DeclKind::TemplateCallable {
                name,
                owner,
                return_rule,
                param_concepts,
            } => (
                name.clone(),
                *owner,
                return_rule.clone(),
                param_concepts.clone(),
            ),
            _ => {
                return Err(AstError::NullTypeBinding(
                    "specialization of a non-template declaration".to_string(),
                ))
            }
        };

        if arg_types.len() != param_concepts.len() {
            return Err(AstError::ArityMismatch {
                expected: param_concepts.len(),
                found: arg_types.len(),
            });
        }

        for (index, &concept) in param_concepts.iter().enumerate() {
            let qualifier = qualifiers.get(index).copied().unwrap_or(Qualifier::None);
            if !self.concept_accepts(concept, qualifier, arg_types[index]) {
                return Err(AstError::ConceptMismatch {
                    index,
                    concept: self.decl(concept).name().to_string(),
                });
            }
        }

        let return_type = match return_override {
            Some(ty) => ty,
            None => self.resolve_return_type(&name, &return_rule, arg_types)?,
        };

        let mut params = Vec::with_capacity(arg_types.len());
        for (index, &ty) in arg_types.iter().enumerate() {
            let qualifier = qualifiers.get(index).copied().unwrap_or(Qualifier::None);
            let param = self.emplace_decl(Decl {
                attrs: Vec::new(),
                kind: DeclKind::Param {
                    name: format!("arg{}", index),
                    ty,
                    qualifier,
                },
            });
            params.push(param);
        }

        Ok((name, owner, return_type, params))
    }

    pub fn specialize_template_function(
        &mut self,
        template: DeclId,
        arg_types: &[TypeId],
        qualifiers: &[Qualifier],
        return_override: Option<TypeId>,
    ) -> AstResult<DeclId> {
        let (name, _, return_type, params) =
            self.specialize(template, arg_types, qualifiers, return_override)?;
        Ok(self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::SpecializedFunction {
                template,
                name,
                return_type,
                params,
            },
        }))
    }

    pub fn specialize_template_method(
        &mut self,
        template: DeclId,
        arg_types: &[TypeId],
        qualifiers: &[Qualifier],
        return_override: Option<TypeId>,
    ) -> AstResult<DeclId> {
        let (name, owner, return_type, params) =
            self.specialize(template, arg_types, qualifiers, return_override)?;
        let owner = owner.ok_or_else(|| {
            AstError::NullTypeBinding(format!("template method `{}` has no owner type", name))
        })?;
        Ok(self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::SpecializedMethod {
                template,
                owner,
                name,
                return_type,
                params,
            },
        }))
    }
}
