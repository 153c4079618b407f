// Per-module arena storage
//
// All nodes of a translation unit live in the owning `Module` and are
// addressed by plain index handles. Handles from one module must never be
// stored into another; accessors carry debug assertions for the index range
// and the database hands each module a distinct id.

use crate::attrs::Attr;
use crate::decls::Decl;
use crate::exprs::Expr;
use crate::stmts::Stmt;
use crate::types::{
    ArrayFlags, BufferFlags, Builtins, RayQueryFlags, TextureFlags, TypeDecl,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use slc_diagnostics::DiagnosticEngine;
use std::collections::HashMap;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Identifies a module inside a [`ModuleDatabase`]
    ModuleId
);
define_id!(
    /// Handle to an interned [`TypeDecl`]
    TypeId
);
define_id!(
    /// Handle to a [`Decl`]
    DeclId
);
define_id!(
    /// Handle to a [`Stmt`]
    StmtId
);
define_id!(
    /// Handle to an [`Expr`]
    ExprId
);
define_id!(
    /// Handle to an [`Attr`]
    AttrId
);

/// Shared home of the modules of a compilation
///
/// The database owns the diagnostics buffer so that multi-file builds share
/// one channel while each module keeps exclusive ownership of its nodes.
#[derive(Debug, Default)]
pub struct ModuleDatabase {
    next_module: u32,
    pub diagnostics: DiagnosticEngine,
}

impl ModuleDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_module_id(&mut self) -> ModuleId {
        let id = ModuleId::new(self.next_module);
        self.next_module += 1;
        id
    }
}

/// A translation unit: arena storage plus the type registry and the
/// intrinsic catalog
pub struct Module {
    id: ModuleId,

    pub(crate) types: Vec<TypeDecl>,
    pub(crate) decls: Vec<Decl>,
    pub(crate) stmts: Vec<Stmt>,
    pub(crate) exprs: Vec<Expr>,
    pub(crate) attrs: Vec<Attr>,

    /// Named types in declaration order (scalars, structures)
    pub(crate) named_types: Vec<TypeId>,
    pub(crate) globals: Vec<DeclId>,
    pub(crate) functions: Vec<DeclId>,
    pub(crate) methods: Vec<DeclId>,
    pub(crate) constructors: Vec<DeclId>,
    pub(crate) namespaces: Vec<DeclId>,
    pub(crate) intrinsics: HashMap<&'static str, DeclId>,

    // Interning caches, keyed on the tuple of defining inputs
    pub(crate) vectors: DashMap<(TypeId, u32), TypeId>,
    pub(crate) matrices: DashMap<(TypeId, [u32; 2]), TypeId>,
    pub(crate) arrays: DashMap<(TypeId, u32, ArrayFlags), TypeId>,
    pub(crate) buffers: DashMap<(Option<TypeId>, BufferFlags), TypeId>,
    pub(crate) constant_buffers: DashMap<TypeId, TypeId>,
    pub(crate) texture2ds: DashMap<(TypeId, TextureFlags), TypeId>,
    pub(crate) texture3ds: DashMap<(TypeId, TextureFlags), TypeId>,
    pub(crate) ray_queries: DashMap<RayQueryFlags, TypeId>,
    pub(crate) sampler: Option<TypeId>,
    pub(crate) accel: Option<TypeId>,

    pub builtins: Builtins,
}

impl Module {
    /// Create a module, materialize the canonical scalar/vector/matrix types
    /// and register the intrinsic catalog.
    pub fn new(db: &mut ModuleDatabase) -> Self {
        let mut module = Self {
            id: db.next_module_id(),
            types: Vec::new(),
            decls: Vec::new(),
            stmts: Vec::new(),
            exprs: Vec::new(),
            attrs: Vec::new(),
            named_types: Vec::new(),
            globals: Vec::new(),
            functions: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            namespaces: Vec::new(),
            intrinsics: HashMap::new(),
            vectors: DashMap::new(),
            matrices: DashMap::new(),
            arrays: DashMap::new(),
            buffers: DashMap::new(),
            constant_buffers: DashMap::new(),
            texture2ds: DashMap::new(),
            texture3ds: DashMap::new(),
            ray_queries: DashMap::new(),
            sampler: None,
            accel: None,
            // Placeholder until bootstrap runs; never observable outside `new`
            builtins: Builtins::zeroed(),
        };
        module.builtins = module.bootstrap_builtins();
        module.declare_intrinsics();
        module
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    // --- node accessors ----------------------------------------------------

    pub fn type_decl(&self, id: TypeId) -> &TypeDecl {
        debug_assert!(id.index() < self.types.len(), "foreign type handle");
        &self.types[id.index()]
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        debug_assert!(id.index() < self.decls.len(), "foreign decl handle");
        &self.decls[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        debug_assert!(id.index() < self.stmts.len(), "foreign stmt handle");
        &self.stmts[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        debug_assert!(id.index() < self.exprs.len(), "foreign expr handle");
        &self.exprs[id.index()]
    }

    pub fn attr(&self, id: AttrId) -> &Attr {
        debug_assert!(id.index() < self.attrs.len(), "foreign attr handle");
        &self.attrs[id.index()]
    }

    // --- arena registration -------------------------------------------------

    pub(crate) fn emplace_decl(&mut self, decl: Decl) -> DeclId {
        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub(crate) fn emplace_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub(crate) fn emplace_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub(crate) fn emplace_attr(&mut self, attr: Attr) -> AttrId {
        let id = AttrId::new(self.attrs.len() as u32);
        self.attrs.push(attr);
        id
    }

    // --- attribute attachment ----------------------------------------------

    pub fn add_decl_attr(&mut self, decl: DeclId, attr: Attr) -> AttrId {
        let id = self.emplace_attr(attr);
        self.decls[decl.index()].attrs.push(id);
        id
    }

    pub fn add_stmt_attr(&mut self, stmt: StmtId, attr: Attr) -> AttrId {
        let id = self.emplace_attr(attr);
        self.stmts[stmt.index()].attrs.push(id);
        id
    }

    pub fn add_type_attr(&mut self, ty: TypeId, attr: Attr) -> AttrId {
        let id = self.emplace_attr(attr);
        self.types[ty.index()].attrs.push(id);
        id
    }

    /// Resolve an attribute id list and find the first attribute matching
    /// the predicate
    pub fn find_attr<'a, F>(&'a self, attrs: &[AttrId], pred: F) -> Option<&'a Attr>
    where
        F: Fn(&Attr) -> bool,
    {
        attrs.iter().map(|&id| self.attr(id)).find(|a| pred(a))
    }

    // --- registration lists -------------------------------------------------

    pub fn named_types(&self) -> &[TypeId] {
        &self.named_types
    }

    pub fn globals(&self) -> &[DeclId] {
        &self.globals
    }

    pub fn functions(&self) -> &[DeclId] {
        &self.functions
    }

    pub fn methods(&self) -> &[DeclId] {
        &self.methods
    }

    pub fn constructors(&self) -> &[DeclId] {
        &self.constructors
    }

    pub fn namespaces(&self) -> &[DeclId] {
        &self.namespaces
    }

    pub fn types_len(&self) -> usize {
        self.types.len()
    }

    /// Iterate every expression in the arena
    pub fn exprs(&self) -> impl Iterator<Item = &Expr> + '_ {
        self.exprs.iter()
    }

    /// Iterate the interned array types (deterministic order by handle)
    pub fn array_types(&self) -> Vec<TypeId> {
        let mut ids: Vec<TypeId> = self.arrays.iter().map(|entry| *entry.value()).collect();
        ids.sort();
        ids
    }
}

impl Builtins {
    fn zeroed() -> Self {
        let z = TypeId::new(0);
        Self {
            void_: z,
            bool_: z,
            bool2: z,
            bool3: z,
            bool4: z,
            half: z,
            half2: z,
            half3: z,
            half4: z,
            float: z,
            float2: z,
            float3: z,
            float4: z,
            float2x2: z,
            float3x3: z,
            float4x4: z,
            int_: z,
            int2: z,
            int3: z,
            int4: z,
            uint: z,
            uint2: z,
            uint3: z,
            uint4: z,
            int64: z,
            uint64: z,
            double: z,
        }
    }
}
