// Catalog-wide checks over the built-in intrinsics

use slc_ast::{BufferFlags, Module, ModuleDatabase, Qualifier, TextureFlags};

fn module() -> Module {
    let mut db = ModuleDatabase::new();
    Module::new(&mut db)
}

const MATH_KEYS: &[&str] = &[
    "ABS", "MIN", "MAX", "CLAMP", "LERP", "ALL", "ANY", "CLZ", "CTZ", "POPCOUNT", "REVERSE",
    "SIN", "SINH", "COS", "COSH", "TAN", "TANH", "ASIN", "ASINH", "ACOS", "ACOSH", "ATAN",
    "ATANH", "EXP", "EXP2", "EXP10", "LOG", "LOG2", "LOG10", "SQRT", "RSQRT", "CEIL", "FLOOR",
    "FRACT", "TRUNC", "ROUND", "LENGTH", "LENGTH_SQUARED", "SATURATE", "DDX", "DDY", "ISINF",
    "ISNAN", "POW", "COPYSIGN", "ATAN2", "STEP", "FMA", "SMOOTHSTEP", "NORMALIZE", "DOT",
    "CROSS", "FACEFORWARD", "REFLECT", "TRANSPOSE", "DETERMINANT", "INVERSE", "SELECT",
];

const RESOURCE_KEYS: &[&str] = &[
    "BUFFER_READ", "BUFFER_WRITE", "BYTE_BUFFER_READ", "BYTE_BUFFER_LOAD", "BYTE_BUFFER_LOAD2",
    "BYTE_BUFFER_LOAD3", "BYTE_BUFFER_LOAD4", "BYTE_BUFFER_WRITE", "BYTE_BUFFER_STORE",
    "BYTE_BUFFER_STORE2", "BYTE_BUFFER_STORE3", "BYTE_BUFFER_STORE4", "TEXTURE_READ",
    "TEXTURE_WRITE", "TEXTURE_SIZE", "SAMPLE2D",
];

const ATOMIC_KEYS: &[&str] = &[
    "InterlockedExchange", "InterlockedCompareExchange", "InterlockedCompareStore",
    "InterlockedAdd", "InterlockedAnd", "InterlockedOr", "InterlockedXor", "InterlockedMin",
    "InterlockedMax",
];

const BARRIER_KEYS: &[&str] = &[
    "AllMemoryBarrier", "AllMemoryBarrierWithGroupSync", "GroupMemoryBarrier",
    "GroupMemoryBarrierWithGroupSync", "DeviceMemoryBarrier", "DeviceMemoryBarrierWithGroupSync",
];

const WAVE_KEYS: &[&str] = &[
    "QuadReadAcrossDiagonal", "QuadReadLaneAt", "QuadReadAcrossX", "QuadReadAcrossY",
    "WaveActiveAllEqual", "WaveActiveBitAnd", "WaveActiveBitOr", "WaveActiveBitXor",
    "WaveActiveCountBits", "WaveActiveMax", "WaveActiveMin", "WaveActiveProduct",
    "WaveActiveSum", "WaveActiveAllTrue", "WaveActiveAnyTrue", "WaveActiveBallot",
    "WaveGetLaneCount", "WaveGetLaneIndex", "WaveIsFirstLane", "WavePrefixCountBits",
    "WavePrefixProduct", "WavePrefixSum", "WaveReadLaneFirst", "WaveReadLaneAt",
];

const RAY_KEYS: &[&str] = &[
    "RAY_QUERY_PROCEED", "RAY_QUERY_COMMITTED_STATUS",
    "RAY_QUERY_COMMITTED_TRIANGLE_BARYCENTRICS", "RAY_QUERY_COMMITTED_PRIMITIVE_INDEX",
    "RAY_QUERY_COMMITTED_INSTANCE_ID", "RAY_QUERY_COMMITTED_PROCEDURAL_DISTANCE",
    "RAY_QUERY_COMMITTED_RAY_T", "RAY_QUERY_CANDIDATE_STATUS",
    "RAY_QUERY_CANDIDATE_TRIANGLE_BARYCENTRICS", "RAY_QUERY_CANDIDATE_PRIMITIVE_INDEX",
    "RAY_QUERY_CANDIDATE_INSTANCE_ID", "RAY_QUERY_CANDIDATE_PROCEDURAL_DISTANCE",
    "RAY_QUERY_CANDIDATE_TRIANGLE_RAY_T", "RAY_QUERY_WORLD_RAY_ORIGIN",
    "RAY_QUERY_WORLD_RAY_DIRECTION", "RAY_QUERY_COMMIT_TRIANGLE",
    "RAY_QUERY_COMMIT_PROCEDURAL", "RAY_QUERY_TERMINATE", "RAY_QUERY_TRACE_RAY_INLINE",
];

#[test]
fn every_catalog_entry_is_registered() {
    let m = module();
    for key in MATH_KEYS
        .iter()
        .chain(RESOURCE_KEYS)
        .chain(ATOMIC_KEYS)
        .chain(BARRIER_KEYS)
        .chain(WAVE_KEYS)
        .chain(RAY_KEYS)
    {
        assert!(m.find_intrinsic(key).is_some(), "missing intrinsic {}", key);
    }
}

#[test]
fn barriers_take_no_arguments_and_return_void() {
    let mut m = module();
    let void_ = m.builtins.void_;
    for key in BARRIER_KEYS {
        let template = m.find_intrinsic(key).unwrap();
        let spec = m
            .specialize_template_function(template, &[], &[], None)
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(void_), "{}", key);
        assert!(m.decl(spec).params().is_empty(), "{}", key);
    }
}

#[test]
fn wave_reductions_return_their_operand_type() {
    let mut m = module();
    let b = m.builtins;
    for key in ["WaveActiveSum", "WaveActiveMin", "WaveActiveMax", "WavePrefixSum"] {
        let template = m.find_intrinsic(key).unwrap();
        let spec = m
            .specialize_template_function(template, &[b.float3], &[Qualifier::None], None)
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(b.float3), "{}", key);
    }
}

#[test]
fn wave_active_all_equal_matches_dimension() {
    let mut m = module();
    let b = m.builtins;
    let template = m.find_intrinsic("WaveActiveAllEqual").unwrap();
    let spec = m
        .specialize_template_function(template, &[b.uint2], &[Qualifier::None], None)
        .unwrap();
    assert_eq!(m.decl(spec).return_type(), Some(b.bool2));
}

#[test]
fn byte_buffer_loads_widen() {
    let mut m = module();
    let b = m.builtins;
    let byte_buffer = m.byte_buffer(BufferFlags::READ_ONLY);
    let expectations = [
        ("BYTE_BUFFER_LOAD", b.uint),
        ("BYTE_BUFFER_LOAD2", b.uint2),
        ("BYTE_BUFFER_LOAD3", b.uint3),
        ("BYTE_BUFFER_LOAD4", b.uint4),
    ];
    for (key, expected) in expectations {
        let template = m.find_intrinsic(key).unwrap();
        let spec = m
            .specialize_template_function(
                template,
                &[byte_buffer, b.uint],
                &[Qualifier::None, Qualifier::None],
                None,
            )
            .unwrap();
        assert_eq!(m.decl(spec).return_type(), Some(expected), "{}", key);
    }
}

#[test]
fn dot_returns_element_scalar() {
    let mut m = module();
    let b = m.builtins;
    let template = m.find_intrinsic("DOT").unwrap();
    let spec = m
        .specialize_template_function(
            template,
            &[b.float3, b.float3],
            &[Qualifier::None, Qualifier::None],
            None,
        )
        .unwrap();
    assert_eq!(m.decl(spec).return_type(), Some(b.float));
}

#[test]
fn texture_read_returns_element() {
    let mut m = module();
    let b = m.builtins;
    let tex = m.texture3d(b.float, TextureFlags::READ_WRITE);
    let template = m.find_intrinsic("TEXTURE_READ").unwrap();
    let spec = m
        .specialize_template_function(
            template,
            &[tex, b.uint3],
            &[Qualifier::None, Qualifier::None],
            None,
        )
        .unwrap();
    assert_eq!(m.decl(spec).return_type(), Some(b.float));
}

#[test]
fn ray_query_intrinsics_validate_their_receiver() {
    let mut m = module();
    let b = m.builtins;
    let rq = m.ray_query(slc_ast::RayQueryFlags::empty());
    let template = m.find_intrinsic("RAY_QUERY_PROCEED").unwrap();
    let spec = m
        .specialize_template_function(template, &[rq], &[Qualifier::None], None)
        .unwrap();
    assert_eq!(m.decl(spec).return_type(), Some(b.bool_));

    // Anything that is not a ray query fails the concept
    let err = m
        .specialize_template_function(template, &[b.uint], &[Qualifier::None], None)
        .unwrap_err();
    assert!(matches!(err, slc_ast::AstError::ConceptMismatch { index: 0, .. }));
}

#[test]
fn atomic_add_specializes_on_element_lvalue() {
    let mut m = module();
    let b = m.builtins;
    let template = m.find_intrinsic("InterlockedAdd").unwrap();
    let spec = m
        .specialize_template_function(
            template,
            &[b.uint, b.uint, b.uint],
            &[Qualifier::None; 3],
            None,
        )
        .unwrap();
    assert_eq!(m.decl(spec).return_type(), Some(b.void_));
}
