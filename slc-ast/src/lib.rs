pub mod arena; // Module arena, handles, module database
pub mod attrs; // Declaration/statement attributes
pub mod concepts; // Concepts and template callables
pub mod decls;
pub mod error;
pub mod exprs;
pub mod intrinsics; // Built-in intrinsic catalog
pub mod stmts;
pub mod types; // Type model and interning registry

pub use arena::{AttrId, DeclId, ExprId, Module, ModuleDatabase, ModuleId, StmtId, TypeId};
pub use attrs::{Attr, InterpolationMode, SemanticType, ShaderStage};
pub use concepts::{ConceptRule, ReturnRule, TypeClass};
pub use decls::{Decl, DeclKind, Qualifier};
pub use error::{AstError, AstResult};
pub use exprs::{BinaryOp, ConstantValue, Expr, ExprKind, UnaryOp};
pub use stmts::{Stmt, StmtKind};
pub use types::{
    ArrayFlags, BufferFlags, Builtins, RayQueryFlags, TextureFlags, TypeDecl, TypeKind,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> Module {
        let mut db = ModuleDatabase::new();
        Module::new(&mut db)
    }

    #[test]
    fn test_vector_interning() {
        let m = module();
        let b = m.builtins;
        // Bootstrap materialized these; repeated lookups return the same
        // handle
        assert_eq!(m.vector(b.float, 4).unwrap(), b.float4);
        assert_eq!(m.vector(b.int_, 2).unwrap(), b.int2);
        assert_eq!(m.matrix(b.float, 4).unwrap(), b.float4x4);
    }

    #[test]
    fn test_unknown_vector_is_fatal() {
        let m = module();
        let b = m.builtins;
        // No 2-vector of int64 was ever declared
        let err = m.vector(b.int64, 2).unwrap_err();
        assert!(matches!(err, AstError::UnknownVectorType { count: 2, .. }));
    }

    #[test]
    fn test_buffer_and_texture_interning() {
        let mut m = module();
        let b = m.builtins;
        let sb0 = m.structured_buffer(b.uint, BufferFlags::READ_WRITE);
        let sb1 = m.structured_buffer(b.uint, BufferFlags::READ_WRITE);
        assert_eq!(sb0, sb1);
        let sb2 = m.structured_buffer(b.uint, BufferFlags::READ_ONLY);
        assert_ne!(sb0, sb2);

        let t0 = m.texture2d(b.float, TextureFlags::READ_ONLY);
        let t1 = m.texture2d(b.float, TextureFlags::READ_ONLY);
        assert_eq!(t0, t1);

        let a0 = m.array(b.float, 3, ArrayFlags::empty());
        let a1 = m.array(b.float, 3, ArrayFlags::empty());
        assert_eq!(a0, a1);

        let rq0 = m.ray_query(RayQueryFlags::FORCE_OPAQUE);
        let rq1 = m.ray_query(RayQueryFlags::FORCE_OPAQUE);
        assert_eq!(rq0, rq1);

        assert_eq!(m.sampler(), m.sampler());
        assert_eq!(m.accel(), m.accel());
    }

    #[test]
    fn test_reserved_words_rejected() {
        let mut m = module();
        for name in ["float", "int", "uint", "bool", "void", "half", "double", "int64_t", "uint64_t"]
        {
            let err = m.declare_scalar(name, 4, 4).unwrap_err();
            assert!(matches!(err, AstError::LexicalCollision(_)), "{}", name);
        }
        let b = m.builtins;
        let err = m.variable(Qualifier::None, b.float, "double", None).unwrap_err();
        assert!(matches!(err, AstError::LexicalCollision(_)));
    }

    #[test]
    fn test_duplicate_structure_rejected() {
        let mut m = module();
        let b = m.builtins;
        let f = m.declare_field("x", b.float).unwrap();
        m.declare_structure("Light", &[f]).unwrap();
        let err = m.declare_structure("Light", &[]).unwrap_err();
        assert!(matches!(err, AstError::DuplicateDeclaration(_)));
    }

    #[test]
    fn test_structure_rejects_resource_field() {
        let mut m = module();
        let b = m.builtins;
        let buf = m.structured_buffer(b.float, BufferFlags::READ_ONLY);
        let f = m.declare_field("data", buf).unwrap();
        let err = m.declare_structure("Bad", &[f]).unwrap_err();
        assert!(matches!(err, AstError::ResourceField { .. }));
    }

    #[test]
    fn test_double_maps_to_float() {
        let m = module();
        assert_eq!(m.builtins.double, m.builtins.float);
    }

    #[test]
    fn test_specialize_abs() {
        let mut m = module();
        let b = m.builtins;
        let abs = m.find_intrinsic("ABS").unwrap();
        let spec = m
            .specialize_template_function(abs, &[b.float3], &[Qualifier::None], None)
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(b.float3));
        assert_eq!(m.decl(spec).params().len(), 1);
    }

    #[test]
    fn test_specialize_arity_mismatch() {
        let mut m = module();
        let b = m.builtins;
        let min = m.find_intrinsic("MIN").unwrap();
        let err = m
            .specialize_template_function(min, &[b.float], &[Qualifier::None], None)
            .unwrap_err();
        assert_eq!(err, AstError::ArityMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_specialize_concept_mismatch() {
        let mut m = module();
        let b = m.builtins;
        let sqrt = m.find_intrinsic("SQRT").unwrap();
        // sqrt wants a float family argument
        let err = m
            .specialize_template_function(sqrt, &[b.int_], &[Qualifier::None], None)
            .unwrap_err();
        assert!(matches!(err, AstError::ConceptMismatch { index: 0, .. }));
    }

    #[test]
    fn test_specialize_buffer_read_element() {
        let mut m = module();
        let b = m.builtins;
        let buf = m.structured_buffer(b.float4, BufferFlags::READ_ONLY);
        let read = m.find_intrinsic("BUFFER_READ").unwrap();
        let spec = m
            .specialize_template_function(
                read,
                &[buf, b.uint],
                &[Qualifier::None, Qualifier::None],
                None,
            )
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(b.float4));
    }

    #[test]
    fn test_specialize_return_override() {
        let mut m = module();
        let b = m.builtins;
        let bbuf = m.byte_buffer(BufferFlags::READ_ONLY);
        let read = m.find_intrinsic("BYTE_BUFFER_READ").unwrap();
        let spec = m
            .specialize_template_function(
                read,
                &[bbuf, b.uint],
                &[Qualifier::None, Qualifier::None],
                Some(b.float2),
            )
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(b.float2));
    }

    #[test]
    fn test_specialize_is_nan_dim() {
        let mut m = module();
        let b = m.builtins;
        let is_nan = m.find_intrinsic("ISNAN").unwrap();
        let spec = m
            .specialize_template_function(is_nan, &[b.float3], &[Qualifier::None], None)
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(b.bool3));
    }

    #[test]
    fn test_sample2d_projects_element() {
        let mut m = module();
        let b = m.builtins;
        let sampler = m.sampler();
        let tex = m.texture2d(b.half, TextureFlags::READ_ONLY);
        let sample = m.find_intrinsic("SAMPLE2D").unwrap();
        let spec = m
            .specialize_template_function(
                sample,
                &[sampler, tex, b.float2],
                &[Qualifier::None; 3],
                None,
            )
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(b.half4));
    }

    #[test]
    fn test_unknown_intrinsic_suggestions() {
        let m = module();
        let err = m.intrinsic("BUFFER_REED").unwrap_err();
        match err {
            AstError::UnknownIntrinsic { suggestions, .. } => {
                assert!(suggestions.contains(&"BUFFER_READ".to_string()));
            }
            other => unreachable!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_void_binding_rejected() {
        let mut m = module();
        let void_ = m.builtins.void_;
        let err = m.declare_param(Qualifier::None, void_, "p").unwrap_err();
        assert!(matches!(err, AstError::NullTypeBinding(_)));
        let err = m.declare_field("f", void_).unwrap_err();
        assert!(matches!(err, AstError::NullTypeBinding(_)));
    }

    #[test]
    fn test_inout_variable_rejected() {
        let mut m = module();
        let b = m.builtins;
        let err = m.variable(Qualifier::Inout, b.float, "v", None).unwrap_err();
        assert!(matches!(err, AstError::QualifierViolation(_)));
    }

    #[test]
    fn test_binary_promotion() {
        let mut m = module();
        let b = m.builtins;
        let (_, mat) = m.variable(Qualifier::None, b.float4x4, "m", None).unwrap();
        let (_, vec) = m.variable(Qualifier::None, b.float4, "v", None).unwrap();
        let mat_ref = m.decl_ref(mat);
        let vec_ref = m.decl_ref(vec);

        let mul = m.binary(BinaryOp::Mul, mat_ref, vec_ref);
        assert_eq!(m.expr(mul).ty, b.float4);

        let (_, s) = m.variable(Qualifier::None, b.float, "s", None).unwrap();
        let s_ref = m.decl_ref(s);
        let broad = m.binary(BinaryOp::Add, vec_ref, s_ref);
        assert_eq!(m.expr(broad).ty, b.float4);

        let cmp = m.binary(BinaryOp::Lt, vec_ref, vec_ref);
        assert_eq!(m.expr(cmp).ty, b.bool4);
    }

    #[test]
    fn test_swizzle_types() {
        let mut m = module();
        let b = m.builtins;
        let (_, v) = m.variable(Qualifier::None, b.float4, "v", None).unwrap();
        let v_ref = m.decl_ref(v);
        let x = m.swizzle(v_ref, &[0]).unwrap();
        assert_eq!(m.expr(x).ty, b.float);
        let xyz = m.swizzle(v_ref, &[0, 1, 2]).unwrap();
        assert_eq!(m.expr(xyz).ty, b.float3);
    }

    #[test]
    fn test_decl_serializes() {
        let mut m = module();
        let b = m.builtins;
        let field = m.declare_field("intensity", b.float).unwrap();
        let json = serde_json::to_string(m.decl(field)).unwrap();
        assert!(json.contains("intensity"));
        let back: Decl = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, m.decl(field));
    }
}
