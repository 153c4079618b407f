// Declarations: variables, callables, namespaces and their factories

use crate::arena::{AttrId, DeclId, ExprId, Module, StmtId, TypeId};
use crate::concepts::{ConceptRule, ReturnRule};
use crate::error::{AstError, AstResult};
use crate::types::TypeKind;
use serde::{Deserialize, Serialize};

/// Variable qualifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualifier {
    None,
    Const,
    Inout,
    Out,
    GroupShared,
}

/// A declaration owned by a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub attrs: Vec<AttrId>,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    Field {
        name: String,
        ty: TypeId,
    },
    Param {
        name: String,
        ty: TypeId,
        qualifier: Qualifier,
    },
    Var {
        name: String,
        ty: TypeId,
        qualifier: Qualifier,
        init: Option<ExprId>,
    },
    GlobalVar {
        name: String,
        ty: TypeId,
        qualifier: Qualifier,
        init: Option<ExprId>,
    },
    Function {
        name: String,
        return_type: TypeId,
        params: Vec<DeclId>,
        body: Option<StmtId>,
    },
    Method {
        owner: TypeId,
        name: String,
        return_type: TypeId,
        params: Vec<DeclId>,
        body: Option<StmtId>,
    },
    Constructor {
        owner: TypeId,
        name: String,
        params: Vec<DeclId>,
        body: Option<StmtId>,
    },
    Namespace {
        name: String,
        parent: Option<DeclId>,
        nested: Vec<DeclId>,
        functions: Vec<DeclId>,
    },
    /// A named predicate over `(qualifier, type)` used as a template
    /// parameter constraint
    Concept {
        name: String,
        rule: ConceptRule,
    },
    TemplateCallable {
        name: String,
        owner: Option<TypeId>,
        return_rule: ReturnRule,
        param_concepts: Vec<DeclId>,
    },
    SpecializedFunction {
        template: DeclId,
        name: String,
        return_type: TypeId,
        params: Vec<DeclId>,
    },
    SpecializedMethod {
        template: DeclId,
        owner: TypeId,
        name: String,
        return_type: TypeId,
        params: Vec<DeclId>,
    },
}

impl Decl {
    pub fn name(&self) -> &str {
        match &self.kind {
            DeclKind::Field { name, .. }
            | DeclKind::Param { name, .. }
            | DeclKind::Var { name, .. }
            | DeclKind::GlobalVar { name, .. }
            | DeclKind::Function { name, .. }
            | DeclKind::Method { name, .. }
            | DeclKind::Constructor { name, .. }
            | DeclKind::Namespace { name, .. }
            | DeclKind::Concept { name, .. }
            | DeclKind::TemplateCallable { name, .. }
            | DeclKind::SpecializedFunction { name, .. }
            | DeclKind::SpecializedMethod { name, .. } => name,
        }
    }

    /// Return type of a callable declaration; constructors yield their owner
    pub fn return_type(&self) -> Option<TypeId> {
        match &self.kind {
            DeclKind::Function { return_type, .. }
            | DeclKind::Method { return_type, .. }
            | DeclKind::SpecializedFunction { return_type, .. }
            | DeclKind::SpecializedMethod { return_type, .. } => Some(*return_type),
            DeclKind::Constructor { owner, .. } => Some(*owner),
            _ => None,
        }
    }

    pub fn params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Function { params, .. }
            | DeclKind::Method { params, .. }
            | DeclKind::Constructor { params, .. }
            | DeclKind::SpecializedFunction { params, .. }
            | DeclKind::SpecializedMethod { params, .. } => params,
            _ => &[],
        }
    }

    pub fn body(&self) -> Option<StmtId> {
        match &self.kind {
            DeclKind::Function { body, .. }
            | DeclKind::Method { body, .. }
            | DeclKind::Constructor { body, .. } => *body,
            _ => None,
        }
    }

    /// Declared type of a variable-like declaration
    pub fn var_type(&self) -> Option<TypeId> {
        match &self.kind {
            DeclKind::Field { ty, .. }
            | DeclKind::Param { ty, .. }
            | DeclKind::Var { ty, .. }
            | DeclKind::GlobalVar { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    pub fn qualifier(&self) -> Qualifier {
        match &self.kind {
            DeclKind::Param { qualifier, .. }
            | DeclKind::Var { qualifier, .. }
            | DeclKind::GlobalVar { qualifier, .. } => *qualifier,
            _ => Qualifier::None,
        }
    }
}

impl Module {
    fn require_concrete(&self, ty: TypeId, what: &str, name: &str) -> AstResult<()> {
        if matches!(self.type_decl(ty).kind, TypeKind::Void) {
            return Err(AstError::NullTypeBinding(format!("{} `{}`", what, name)));
        }
        Ok(())
    }

    pub fn declare_field(&mut self, name: &str, ty: TypeId) -> AstResult<DeclId> {
        self.require_concrete(ty, "field", name)?;
        self.reserved_words_check(name)?;
        Ok(self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Field { name: name.to_string(), ty },
        }))
    }

    pub fn declare_param(
        &mut self,
        qualifier: Qualifier,
        ty: TypeId,
        name: &str,
    ) -> AstResult<DeclId> {
        self.require_concrete(ty, "param", name)?;
        self.reserved_words_check(name)?;
        Ok(self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Param {
                name: name.to_string(),
                ty,
                qualifier,
            },
        }))
    }

    pub fn declare_global_constant(
        &mut self,
        ty: TypeId,
        name: &str,
        init: Option<ExprId>,
    ) -> AstResult<DeclId> {
        self.require_concrete(ty, "global constant", name)?;
        self.reserved_words_check(name)?;
        let id = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::GlobalVar {
                name: name.to_string(),
                ty,
                qualifier: Qualifier::Const,
                init,
            },
        });
        self.globals.push(id);
        Ok(id)
    }

    pub fn declare_group_shared(
        &mut self,
        ty: TypeId,
        name: &str,
        init: Option<ExprId>,
    ) -> AstResult<DeclId> {
        self.require_concrete(ty, "group shared", name)?;
        self.reserved_words_check(name)?;
        let id = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::GlobalVar {
                name: name.to_string(),
                ty,
                qualifier: Qualifier::GroupShared,
                init,
            },
        });
        self.globals.push(id);
        Ok(id)
    }

    pub fn declare_global_resource(&mut self, ty: TypeId, name: &str) -> AstResult<DeclId> {
        self.require_concrete(ty, "global resource", name)?;
        self.reserved_words_check(name)?;
        let id = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::GlobalVar {
                name: name.to_string(),
                ty,
                qualifier: Qualifier::None,
                init: None,
            },
        });
        self.globals.push(id);
        Ok(id)
    }

    pub fn declare_function(
        &mut self,
        name: &str,
        return_type: TypeId,
        params: &[DeclId],
        body: StmtId,
    ) -> AstResult<DeclId> {
        self.reserved_words_check(name)?;
        let id = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Function {
                name: name.to_string(),
                return_type,
                params: params.to_vec(),
                body: Some(body),
            },
        });
        self.functions.push(id);
        Ok(id)
    }

    pub fn declare_method(
        &mut self,
        owner: TypeId,
        name: &str,
        return_type: TypeId,
        params: &[DeclId],
        body: StmtId,
    ) -> AstResult<DeclId> {
        self.reserved_words_check(name)?;
        let id = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Method {
                owner,
                name: name.to_string(),
                return_type,
                params: params.to_vec(),
                body: Some(body),
            },
        });
        self.methods.push(id);
        if let TypeKind::Structure { methods, .. } = &mut self.types[owner.index()].kind {
            methods.push(id);
        }
        Ok(id)
    }

    pub fn declare_constructor(
        &mut self,
        owner: TypeId,
        name: &str,
        params: &[DeclId],
        body: StmtId,
    ) -> AstResult<DeclId> {
        self.reserved_words_check(name)?;
        let id = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Constructor {
                owner,
                name: name.to_string(),
                params: params.to_vec(),
                body: Some(body),
            },
        });
        self.constructors.push(id);
        if let TypeKind::Structure { constructors, .. } = &mut self.types[owner.index()].kind {
            constructors.push(id);
        }
        Ok(id)
    }

    pub fn declare_namespace(&mut self, name: &str, parent: Option<DeclId>) -> AstResult<DeclId> {
        self.reserved_words_check(name)?;
        let id = self.emplace_decl(Decl {
            attrs: Vec::new(),
            kind: DeclKind::Namespace {
                name: name.to_string(),
                parent,
                nested: Vec::new(),
                functions: Vec::new(),
            },
        });
        self.namespaces.push(id);
        if let Some(parent) = parent {
            if let DeclKind::Namespace { nested, .. } = &mut self.decls[parent.index()].kind {
                nested.push(id);
            }
        }
        Ok(id)
    }

    /// Attach a previously declared free function to a namespace
    pub fn add_namespace_function(&mut self, namespace: DeclId, function: DeclId) {
        if let DeclKind::Namespace { functions, .. } = &mut self.decls[namespace.index()].kind {
            functions.push(function);
        }
    }
}
