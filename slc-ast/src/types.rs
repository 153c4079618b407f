// Type model and the interning type registry
//
// Every composite type request is keyed on the tuple of its defining inputs;
// equal inputs always return the handle created first.

use crate::arena::{AttrId, DeclId, Module, TypeId};
use crate::decls::DeclKind;
use crate::error::{AstError, AstResult};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BufferFlags: u32 {
        const READ_ONLY = 0x1;
        const READ_WRITE = 0x2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TextureFlags: u32 {
        const READ_ONLY = 0x1;
        const READ_WRITE = 0x2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ArrayFlags: u32 {
        /// Thread-group shared storage
        const SHARED = 0x1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RayQueryFlags: u32 {
        const FORCE_OPAQUE = 0x1;
        const FORCE_NON_OPAQUE = 0x2;
        const ACCEPT_FIRST_AND_END_SEARCH = 0x4;

        const CULL_BACK_FACE = 0x10;
        const CULL_FRONT_FACE = 0x20;

        const CULL_OPAQUE = 0x40;
        const CULL_NON_OPAQUE = 0x80;

        const CULL_TRIANGLE = 0x100;
        const CULL_PROCEDURAL = 0x200;
    }
}

/// A type declaration owned by a module
///
/// Types are immutable after creation except for structures, which accumulate
/// their method/constructor membership as those are declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub size: u32,
    pub align: u32,
    /// Builtin types construct with `T(args)`; user structures go through the
    /// backend's constructor lowering
    pub builtin: bool,
    pub attrs: Vec<AttrId>,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Void,
    Scalar,
    Vector { element: TypeId, count: u32 },
    Matrix { element: TypeId, n: u32 },
    Array { element: TypeId, count: u32, flags: ArrayFlags },
    Structure {
        fields: Vec<DeclId>,
        methods: Vec<DeclId>,
        constructors: Vec<DeclId>,
    },
    ConstantBuffer { element: TypeId },
    StructuredBuffer { element: TypeId, flags: BufferFlags },
    ByteBuffer { flags: BufferFlags },
    Texture2D { element: TypeId, flags: TextureFlags },
    Texture3D { element: TypeId, flags: TextureFlags },
    Sampler,
    Accel,
    RayQuery { flags: RayQueryFlags },
}

/// Handles to the canonical types materialized at module creation
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub void_: TypeId,

    pub bool_: TypeId,
    pub bool2: TypeId,
    pub bool3: TypeId,
    pub bool4: TypeId,

    pub half: TypeId,
    pub half2: TypeId,
    pub half3: TypeId,
    pub half4: TypeId,

    pub float: TypeId,
    pub float2: TypeId,
    pub float3: TypeId,
    pub float4: TypeId,
    pub float2x2: TypeId,
    pub float3x3: TypeId,
    pub float4x4: TypeId,

    pub int_: TypeId,
    pub int2: TypeId,
    pub int3: TypeId,
    pub int4: TypeId,

    pub uint: TypeId,
    pub uint2: TypeId,
    pub uint3: TypeId,
    pub uint4: TypeId,

    pub int64: TypeId,
    pub uint64: TypeId,

    /// Shader targets have no double; the handle resolves to `float`
    pub double: TypeId,
}

pub(crate) const RESERVED_WORDS: &[&str] = &[
    "float", "int", "uint", "bool", "void", "half", "double", "int64_t", "uint64_t",
];

fn vector_align(element_align: u32, count: u32) -> u32 {
    match count {
        2 => element_align * 2,
        _ => element_align * 4,
    }
}

impl Module {
    pub(crate) fn reserved_words_check(&self, name: &str) -> AstResult<()> {
        if RESERVED_WORDS.contains(&name) {
            return Err(AstError::LexicalCollision(name.to_string()));
        }
        Ok(())
    }

    fn push_type(&mut self, decl: TypeDecl) -> TypeId {
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(decl);
        id
    }

    pub(crate) fn declare_scalar_unchecked(&mut self, name: &str, size: u32, align: u32) -> TypeId {
        let id = self.push_type(TypeDecl {
            name: name.to_string(),
            size,
            align,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Scalar,
        });
        self.named_types.push(id);
        id
    }

    pub(crate) fn declare_void(&mut self) -> TypeId {
        let id = self.push_type(TypeDecl {
            name: "void".to_string(),
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Void,
        });
        self.named_types.push(id);
        id
    }

    /// Declare a new named scalar type. Fails if the name is reserved or
    /// already taken.
    pub fn declare_scalar(&mut self, name: &str, size: u32, align: u32) -> AstResult<TypeId> {
        self.reserved_words_check(name)?;
        if self.get_type(name).is_some() {
            return Err(AstError::DuplicateDeclaration(name.to_string()));
        }
        Ok(self.declare_scalar_unchecked(name, size, align))
    }

    /// Declare a named structure with an ordered field list
    pub fn declare_structure(&mut self, name: &str, fields: &[DeclId]) -> AstResult<TypeId> {
        self.reserved_words_check(name)?;
        if self.get_type(name).is_some() {
            return Err(AstError::DuplicateDeclaration(name.to_string()));
        }

        // Structures hold values only; resources bind at global scope
        let mut size = 0u32;
        let mut align = 1u32;
        for &field in fields {
            let field_ty = match &self.decl(field).kind {
                DeclKind::Field { name: fname, ty } => {
                    if self.is_resource(*ty) {
                        return Err(AstError::ResourceField {
                            field: fname.clone(),
                            ty: self.type_decl(*ty).name.clone(),
                        });
                    }
                    *ty
                }
                _ => continue,
            };
            let ft = self.type_decl(field_ty);
            let fa = ft.align.max(1);
            size = (size + fa - 1) / fa * fa + ft.size;
            align = align.max(fa);
        }
        size = (size + align - 1) / align * align;

        let id = self.push_type(TypeDecl {
            name: name.to_string(),
            size,
            align,
            builtin: false,
            attrs: Vec::new(),
            kind: TypeKind::Structure {
                fields: fields.to_vec(),
                methods: Vec::new(),
                constructors: Vec::new(),
            },
        });
        self.named_types.push(id);
        Ok(id)
    }

    pub(crate) fn declare_vector_type(&mut self, element: TypeId, count: u32) -> TypeId {
        let key = (element, count);
        if let Some(found) = self.vectors.get(&key) {
            return *found;
        }
        let elem = self.type_decl(element).clone();
        let id = self.push_type(TypeDecl {
            name: format!("{}{}", elem.name, count),
            size: elem.size * count,
            align: vector_align(elem.align, count),
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Vector { element, count },
        });
        self.named_types.push(id);
        self.vectors.insert(key, id);
        id
    }

    /// Look up an interned vector type. Unlike the bootstrap declaration
    /// path, asking for a combination that was never materialized is fatal.
    pub fn vector(&self, element: TypeId, count: u32) -> AstResult<TypeId> {
        self.vectors
            .get(&(element, count))
            .map(|r| *r)
            .ok_or_else(|| AstError::UnknownVectorType {
                element: self.type_decl(element).name.clone(),
                count,
            })
    }

    pub(crate) fn declare_matrix_type(&mut self, element: TypeId, n: u32) -> TypeId {
        // Matrices are square; the cache key keeps the (n, n) shape anyway
        let key = (element, [n, n]);
        if let Some(found) = self.matrices.get(&key) {
            return *found;
        }
        let elem = self.type_decl(element).clone();
        let id = self.push_type(TypeDecl {
            name: format!("{}{}x{}", elem.name, n, n),
            size: elem.size * n * n,
            align: vector_align(elem.align, n),
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Matrix { element, n },
        });
        self.named_types.push(id);
        self.matrices.insert(key, id);
        id
    }

    pub fn matrix(&self, element: TypeId, n: u32) -> AstResult<TypeId> {
        self.matrices
            .get(&(element, [n, n]))
            .map(|r| *r)
            .ok_or_else(|| AstError::UnknownMatrixType {
                element: self.type_decl(element).name.clone(),
                n,
            })
    }

    /// Interned array type; `count == 0` with a resource element means a
    /// bindless array
    pub fn array(&mut self, element: TypeId, count: u32, flags: ArrayFlags) -> TypeId {
        let key = (element, count, flags);
        if let Some(found) = self.arrays.get(&key) {
            return *found;
        }
        let elem = self.type_decl(element).clone();
        let id = self.push_type(TypeDecl {
            name: format!("array<{}, {}>", elem.name, count),
            size: elem.size * count,
            align: elem.align,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Array { element, count, flags },
        });
        self.arrays.insert(key, id);
        id
    }

    pub fn constant_buffer(&mut self, element: TypeId) -> TypeId {
        if let Some(found) = self.constant_buffers.get(&element) {
            return *found;
        }
        let name = format!("ConstantBuffer<{}>", self.type_decl(element).name);
        let id = self.push_type(TypeDecl {
            name,
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::ConstantBuffer { element },
        });
        self.constant_buffers.insert(element, id);
        id
    }

    pub fn structured_buffer(&mut self, element: TypeId, flags: BufferFlags) -> TypeId {
        let key = (Some(element), flags);
        if let Some(found) = self.buffers.get(&key) {
            return *found;
        }
        let prefix = if flags.contains(BufferFlags::READ_WRITE) { "RW" } else { "" };
        let name = format!("{}StructuredBuffer<{}>", prefix, self.type_decl(element).name);
        let id = self.push_type(TypeDecl {
            name,
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::StructuredBuffer { element, flags },
        });
        self.buffers.insert(key, id);
        id
    }

    pub fn byte_buffer(&mut self, flags: BufferFlags) -> TypeId {
        let key = (None, flags);
        if let Some(found) = self.buffers.get(&key) {
            return *found;
        }
        let prefix = if flags.contains(BufferFlags::READ_WRITE) { "RW" } else { "" };
        let id = self.push_type(TypeDecl {
            name: format!("{}ByteAddressBuffer", prefix),
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::ByteBuffer { flags },
        });
        self.buffers.insert(key, id);
        id
    }

    pub fn texture2d(&mut self, element: TypeId, flags: TextureFlags) -> TypeId {
        let key = (element, flags);
        if let Some(found) = self.texture2ds.get(&key) {
            return *found;
        }
        let prefix = if flags.contains(TextureFlags::READ_WRITE) { "RW" } else { "" };
        let name = format!("{}Texture2D<{}>", prefix, self.type_decl(element).name);
        let id = self.push_type(TypeDecl {
            name,
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Texture2D { element, flags },
        });
        self.texture2ds.insert(key, id);
        id
    }

    pub fn texture3d(&mut self, element: TypeId, flags: TextureFlags) -> TypeId {
        let key = (element, flags);
        if let Some(found) = self.texture3ds.get(&key) {
            return *found;
        }
        let prefix = if flags.contains(TextureFlags::READ_WRITE) { "RW" } else { "" };
        let name = format!("{}Texture3D<{}>", prefix, self.type_decl(element).name);
        let id = self.push_type(TypeDecl {
            name,
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Texture3D { element, flags },
        });
        self.texture3ds.insert(key, id);
        id
    }

    /// The per-module sampler singleton
    pub fn sampler(&mut self) -> TypeId {
        if let Some(id) = self.sampler {
            return id;
        }
        let id = self.push_type(TypeDecl {
            name: "SamplerState".to_string(),
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Sampler,
        });
        self.sampler = Some(id);
        id
    }

    /// The per-module ray-tracing acceleration structure singleton
    pub fn accel(&mut self) -> TypeId {
        if let Some(id) = self.accel {
            return id;
        }
        let id = self.push_type(TypeDecl {
            name: "RaytracingAccelerationStructure".to_string(),
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::Accel,
        });
        self.accel = Some(id);
        id
    }

    pub fn ray_query(&mut self, flags: RayQueryFlags) -> TypeId {
        if let Some(found) = self.ray_queries.get(&flags) {
            return *found;
        }
        let id = self.push_type(TypeDecl {
            name: format!("RayQuery<{}>", flags.bits()),
            size: 0,
            align: 0,
            builtin: true,
            attrs: Vec::new(),
            kind: TypeKind::RayQuery { flags },
        });
        self.ray_queries.insert(flags, id);
        id
    }

    /// Linear name lookup over declared named types
    pub fn get_type(&self, name: &str) -> Option<TypeId> {
        self.named_types
            .iter()
            .copied()
            .find(|&id| self.type_decl(id).name == name)
    }

    // --- classification helpers -------------------------------------------

    pub fn is_resource(&self, ty: TypeId) -> bool {
        matches!(
            self.type_decl(ty).kind,
            TypeKind::ConstantBuffer { .. }
                | TypeKind::StructuredBuffer { .. }
                | TypeKind::ByteBuffer { .. }
                | TypeKind::Texture2D { .. }
                | TypeKind::Texture3D { .. }
                | TypeKind::Sampler
                | TypeKind::Accel
        )
    }

    /// Value types: everything constructible in a function body
    pub fn is_value(&self, ty: TypeId) -> bool {
        matches!(
            self.type_decl(ty).kind,
            TypeKind::Scalar
                | TypeKind::Vector { .. }
                | TypeKind::Matrix { .. }
                | TypeKind::Array { .. }
                | TypeKind::Structure { .. }
        )
    }

    pub fn is_scalar(&self, ty: TypeId) -> bool {
        matches!(self.type_decl(ty).kind, TypeKind::Scalar)
    }

    pub fn is_vector(&self, ty: TypeId) -> bool {
        matches!(self.type_decl(ty).kind, TypeKind::Vector { .. })
    }

    pub fn is_matrix(&self, ty: TypeId) -> bool {
        matches!(self.type_decl(ty).kind, TypeKind::Matrix { .. })
    }

    pub fn is_array(&self, ty: TypeId) -> bool {
        matches!(self.type_decl(ty).kind, TypeKind::Array { .. })
    }

    /// Bindless: unbounded array whose element is a resource
    pub fn is_bindless_array(&self, ty: TypeId) -> bool {
        match self.type_decl(ty).kind {
            TypeKind::Array { element, count, .. } => count == 0 && self.is_resource(element),
            _ => false,
        }
    }

    /// Element type of vectors, matrices, arrays, buffers and textures
    pub fn element_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.type_decl(ty).kind {
            TypeKind::Vector { element, .. }
            | TypeKind::Matrix { element, .. }
            | TypeKind::Array { element, .. }
            | TypeKind::ConstantBuffer { element }
            | TypeKind::StructuredBuffer { element, .. }
            | TypeKind::Texture2D { element, .. }
            | TypeKind::Texture3D { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Component count of a vector type
    pub fn vector_count(&self, ty: TypeId) -> Option<u32> {
        match self.type_decl(ty).kind {
            TypeKind::Vector { count, .. } => Some(count),
            _ => None,
        }
    }

    pub(crate) fn bootstrap_builtins(&mut self) -> Builtins {
        let void_ = self.declare_void();

        let bool_ = self.declare_scalar_unchecked("bool", 4, 4);
        let bool2 = self.declare_vector_type(bool_, 2);
        let bool3 = self.declare_vector_type(bool_, 3);
        let bool4 = self.declare_vector_type(bool_, 4);

        let half = self.declare_scalar_unchecked("half", 4, 4);
        let half2 = self.declare_vector_type(half, 2);
        let half3 = self.declare_vector_type(half, 3);
        let half4 = self.declare_vector_type(half, 4);

        let float = self.declare_scalar_unchecked("float", 4, 4);
        let float2 = self.declare_vector_type(float, 2);
        let float3 = self.declare_vector_type(float, 3);
        let float4 = self.declare_vector_type(float, 4);
        let float2x2 = self.declare_matrix_type(float, 2);
        let float3x3 = self.declare_matrix_type(float, 3);
        let float4x4 = self.declare_matrix_type(float, 4);

        let int_ = self.declare_scalar_unchecked("int", 4, 4);
        let int2 = self.declare_vector_type(int_, 2);
        let int3 = self.declare_vector_type(int_, 3);
        let int4 = self.declare_vector_type(int_, 4);

        let uint = self.declare_scalar_unchecked("uint", 4, 4);
        let uint2 = self.declare_vector_type(uint, 2);
        let uint3 = self.declare_vector_type(uint, 3);
        let uint4 = self.declare_vector_type(uint, 4);

        let int64 = self.declare_scalar_unchecked("int64", 8, 8);
        let uint64 = self.declare_scalar_unchecked("uint64", 8, 8);

        Builtins {
            void_,
            bool_,
            bool2,
            bool3,
            bool4,
            half,
            half2,
            half3,
            half4,
            float,
            float2,
            float3,
            float4,
            float2x2,
            float3x3,
            float4x4,
            int_,
            int2,
            int3,
            int4,
            uint,
            uint2,
            uint3,
            uint4,
            int64,
            uint64,
            double: float,
        }
    }
}
