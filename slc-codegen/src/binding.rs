// Resource binding allocation
//
// Assigns a stable (space, register) to every bound global resource before
// the global section is printed. Push constants and bindless arrays always
// claim a space of their own; everything else shares a lazily allocated
// space. Allocation is deterministic in the declaration order of the
// globals.

use crate::error::{CodegenError, CodegenResult};
use log::debug;
use slc_ast::{Attr, DeclId, Module, TypeId, TypeKind};
use slc_diagnostics::{codes, DiagnosticEngine};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Sparse set of used numbers with first-gap allocation
#[derive(Debug, Default)]
pub struct SparseSequence {
    used: BTreeSet<u32>,
}

impl SparseSequence {
    pub fn try_allocate(&mut self, number: u32) -> bool {
        self.used.insert(number)
    }

    /// Allocate the smallest number not yet used
    pub fn allocate(&mut self) -> u32 {
        let mut candidate = 0;
        for &used in &self.used {
            if used > candidate {
                break;
            }
            candidate = used + 1;
        }
        self.used.insert(candidate);
        candidate
    }

    pub fn is_used(&self, number: u32) -> bool {
        self.used.contains(&number)
    }
}

/// Two-level allocator: a space set plus per-space register sets
#[derive(Debug, Default)]
struct BindTable {
    spaces: SparseSequence,
    registers: BTreeMap<u32, SparseSequence>,
    shared_space: Option<u32>,
}

impl BindTable {
    /// Reserve a fully specified pair; false means it was already taken
    fn reserve(&mut self, space: u32, register: u32) -> bool {
        self.spaces.try_allocate(space);
        self.registers.entry(space).or_default().try_allocate(register)
    }

    /// Allocate honoring the parts of the constraint that were given.
    /// Returns the final pair plus whether a requested register had to be
    /// moved.
    fn allocate(
        &mut self,
        unique_space: bool,
        space: Option<u32>,
        register: Option<u32>,
    ) -> (u32, u32, bool) {
        let final_space = match space {
            Some(space) => {
                self.spaces.try_allocate(space);
                space
            }
            None => {
                if unique_space {
                    self.spaces.allocate()
                } else {
                    match self.shared_space {
                        Some(shared) => shared,
                        None => {
                            let shared = self.spaces.allocate();
                            self.shared_space = Some(shared);
                            shared
                        }
                    }
                }
            }
        };

        let registers = self.registers.entry(final_space).or_default();
        match register {
            Some(register) => {
                if registers.try_allocate(register) {
                    (final_space, register, false)
                } else {
                    // Keep the space, move the register
                    (final_space, registers.allocate(), true)
                }
            }
            None => (final_space, registers.allocate(), false),
        }
    }
}

/// The assignment recorded for a global resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub space: u32,
    pub register: u32,
    pub is_push: bool,
    pub is_bindless: bool,
}

/// Resource classes mapped to HLSL register letters
pub fn register_letter(module: &Module, ty: TypeId) -> char {
    match module.type_decl(ty).kind {
        TypeKind::ConstantBuffer { .. } => 'b',
        TypeKind::StructuredBuffer { flags, .. } => {
            if flags.contains(slc_ast::BufferFlags::READ_WRITE) {
                'u'
            } else {
                't'
            }
        }
        TypeKind::ByteBuffer { flags } => {
            if flags.contains(slc_ast::BufferFlags::READ_WRITE) {
                'u'
            } else {
                't'
            }
        }
        TypeKind::Texture2D { flags, .. } | TypeKind::Texture3D { flags, .. } => {
            if flags.contains(slc_ast::TextureFlags::READ_WRITE) {
                'u'
            } else {
                't'
            }
        }
        TypeKind::Sampler => 's',
        TypeKind::Accel => 't',
        _ => '0',
    }
}

/// Strip array layers down to the leaf resource type
pub fn leaf_resource_type(module: &Module, mut ty: TypeId) -> TypeId {
    while let TypeKind::Array { element, .. } = module.type_decl(ty).kind {
        ty = element;
    }
    ty
}

/// A global binds through the allocator when its (array-unwrapped) type is a
/// resource
pub fn is_resource_global(module: &Module, ty: TypeId) -> bool {
    module.is_resource(leaf_resource_type(module, ty))
}

fn resource_bind(module: &Module, var: DeclId) -> Option<(Option<u32>, Option<u32>)> {
    let attrs = &module.decl(var).attrs;
    module
        .find_attr(attrs, |a| matches!(a, Attr::ResourceBind { .. }))
        .and_then(|a| match a {
            Attr::ResourceBind { group, binding } => Some((*group, *binding)),
            _ => None,
        })
}

fn is_push_constant(module: &Module, var: DeclId) -> bool {
    module
        .find_attr(&module.decl(var).attrs, |a| matches!(a, Attr::PushConstant))
        .is_some()
}

/// Allocate (space, register) for every bound global resource
///
/// Globals without a `ResourceBind` attribute are left unbound; the backend
/// prints them without binding decorations.
pub fn allocate_bindings(
    module: &Module,
    diags: &mut DiagnosticEngine,
) -> CodegenResult<BTreeMap<DeclId, Binding>> {
    let mut table = BindTable::default();
    let mut bindings = BTreeMap::new();

    let mut regular = Vec::new();
    let mut bindless = Vec::new();
    let mut push = Vec::new();
    let mut auto_constraints: BTreeMap<DeclId, (Option<u32>, Option<u32>)> = BTreeMap::new();

    // First pass: classify and reserve every fully specified pair
    for &var in module.globals() {
        let ty = match module.decl(var).var_type() {
            Some(ty) => ty,
            None => continue,
        };
        if !is_resource_global(module, ty) {
            continue;
        }
        let (space, register) = match resource_bind(module, var) {
            Some(constraint) => constraint,
            None => continue,
        };

        if is_push_constant(module, var) {
            push.push(var);
        } else if module.is_bindless_array(ty) {
            bindless.push(var);
        } else {
            regular.push(var);
        }

        match (space, register) {
            (Some(space), Some(register)) => {
                if !table.reserve(space, register) {
                    return Err(CodegenError::BindingConflict(format!(
                        "resource `{}` requests register {} in space {}, which is already reserved",
                        module.decl(var).name(),
                        register,
                        space
                    )));
                }
                let is_push = is_push_constant(module, var);
                bindings.insert(
                    var,
                    Binding {
                        space,
                        register,
                        is_push,
                        is_bindless: module.is_bindless_array(ty),
                    },
                );
            }
            constraint => {
                auto_constraints.insert(var, constraint);
            }
        }
    }

    let assign = |table: &mut BindTable,
                      diags: &mut DiagnosticEngine,
                      var: DeclId,
                      unique_space: bool,
                      is_push: bool,
                      is_bindless: bool|
     -> Option<Binding> {
        let (space, register) = *auto_constraints.get(&var)?;
        let (space, register, moved) = table.allocate(unique_space, space, register);
        if moved {
            diags.warn(
                codes::PARTIAL_BINDING,
                format!(
                    "resource `{}` kept its requested space {} but its register moved to {}",
                    module.decl(var).name(),
                    space,
                    register
                ),
            );
        }
        debug!(
            "bound `{}` to space {} register {}",
            module.decl(var).name(),
            space,
            register
        );
        Some(Binding {
            space,
            register,
            is_push,
            is_bindless,
        })
    };

    // Regular resources share a space, then bindless and push constants each
    // claim an untouched one
    for &var in &regular {
        if let Some(binding) = assign(&mut table, diags, var, false, false, false) {
            bindings.insert(var, binding);
        }
    }
    for &var in &bindless {
        if let Some(binding) = assign(&mut table, diags, var, true, false, true) {
            bindings.insert(var, binding);
        }
    }
    for &var in &push {
        if let Some(binding) = assign(&mut table, diags, var, true, true, false) {
            bindings.insert(var, binding);
        }
    }

    verify_space_isolation(module, &bindings)?;
    Ok(bindings)
}

/// Push-constant and bindless spaces must not host any other resource
fn verify_space_isolation(
    module: &Module,
    bindings: &BTreeMap<DeclId, Binding>,
) -> CodegenResult<()> {
    let mut space_members: BTreeMap<u32, Vec<DeclId>> = BTreeMap::new();
    for (&var, binding) in bindings {
        space_members.entry(binding.space).or_default().push(var);
    }

    for (&var, binding) in bindings {
        if !binding.is_push && !binding.is_bindless {
            continue;
        }
        let members = space_members.get(&binding.space).map(Vec::as_slice).unwrap_or(&[]);
        if members.len() > 1 {
            let kind = if binding.is_push { "push constant" } else { "bindless resource" };
            let others: Vec<&str> = members
                .iter()
                .filter(|&&m| m != var)
                .map(|&m| module.decl(m).name())
                .collect();
            return Err(CodegenError::BindingConflict(format!(
                "{} `{}` at space {} conflicts with other resources: `{}`",
                kind,
                module.decl(var).name(),
                binding.space,
                others.join("`, `")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_gap_allocation() {
        let mut seq = SparseSequence::default();
        assert_eq!(seq.allocate(), 0);
        assert_eq!(seq.allocate(), 1);
        assert!(seq.try_allocate(3));
        assert_eq!(seq.allocate(), 2);
        // 0..3 now taken, so the next gap is 4
        assert_eq!(seq.allocate(), 4);
        assert!(!seq.try_allocate(1));
        assert!(seq.is_used(3));
    }

    #[test]
    fn test_reserved_register_not_reused() {
        let mut table = BindTable::default();
        assert!(table.reserve(3, 5));
        assert!(!table.reserve(3, 5));
        let (space, register, moved) = table.allocate(false, Some(3), None);
        assert_eq!(space, 3);
        assert_eq!(register, 0);
        assert!(!moved);
    }

    #[test]
    fn test_register_without_space() {
        let mut table = BindTable::default();
        // The register request is honored inside the shared space
        let (space, register, moved) = table.allocate(false, None, Some(7));
        assert_eq!(space, 0);
        assert_eq!(register, 7);
        assert!(!moved);
        // A second request for the same register moves, keeping the space
        let (space, register, moved) = table.allocate(false, None, Some(7));
        assert_eq!(space, 0);
        assert_eq!(register, 0);
        assert!(moved);
    }

    #[test]
    fn test_unique_space_allocation() {
        let mut table = BindTable::default();
        let (shared, _, _) = table.allocate(false, None, None);
        let (unique_a, _, _) = table.allocate(true, None, None);
        let (unique_b, _, _) = table.allocate(true, None, None);
        assert_ne!(shared, unique_a);
        assert_ne!(unique_a, unique_b);
    }

    #[test]
    fn test_partial_constraint_keeps_space() {
        let mut table = BindTable::default();
        assert!(table.reserve(2, 0));
        let (space, register, moved) = table.allocate(false, Some(2), Some(0));
        assert_eq!(space, 2);
        assert_eq!(register, 1);
        assert!(moved);
    }
}
