// Built-in intrinsic catalog
//
// A fixed table populated at module creation. Each entry is a template
// callable under an opaque string key; call sites look the template up and
// specialize it with their concrete argument tuple.

use crate::arena::{DeclId, Module};
use crate::concepts::{ConceptRule, ReturnRule, TypeClass};
use crate::error::{AstError, AstResult};
use slc_diagnostics::fuzzy;

impl Module {
    fn intrinsic_fn(
        &mut self,
        key: &'static str,
        name: &str,
        rule: ReturnRule,
        concepts: &[DeclId],
    ) {
        let template = self.declare_template_function(name, rule, concepts);
        self.intrinsics.insert(key, template);
    }

    /// Look up an intrinsic template by its catalog key
    pub fn find_intrinsic(&self, key: &str) -> Option<DeclId> {
        self.intrinsics.get(key).copied()
    }

    /// Like [`Module::find_intrinsic`], but failure carries fuzzy name
    /// suggestions for the diagnostic
    pub fn intrinsic(&self, key: &str) -> AstResult<DeclId> {
        self.find_intrinsic(key).ok_or_else(|| {
            let candidates: Vec<String> = self.intrinsics.keys().map(|k| k.to_string()).collect();
            AstError::UnknownIntrinsic {
                name: key.to_string(),
                suggestions: fuzzy::find_similar_names(key, &candidates, 0.8, 3),
            }
        })
    }

    pub(crate) fn declare_intrinsics(&mut self) {
        let b = self.builtins;

        let vector4d = self.declare_concept(
            "Vector4D",
            ConceptRule::AnyOf(vec![b.float4, b.int4, b.uint4, b.bool4]),
        );

        let int_scalar = self.declare_concept(
            "IntScalar",
            ConceptRule::AnyOf(vec![b.int_, b.uint, b.int64, b.uint64]),
        );
        let int_vector = self.declare_concept(
            "IntVector",
            ConceptRule::AnyOf(vec![b.int2, b.int3, b.int4, b.uint2, b.uint3, b.uint4]),
        );

        let float_scalar =
            self.declare_concept("FloatScalar", ConceptRule::AnyOf(vec![b.float, b.half]));
        let float_vector = self.declare_concept(
            "FloatVector",
            ConceptRule::AnyOf(vec![b.float2, b.float3, b.float4]),
        );
        let float_vector3d =
            self.declare_concept("FloatVector3D", ConceptRule::AnyOf(vec![b.float3]));

        let value_family = self.declare_concept("ValueFamily", ConceptRule::Class(TypeClass::Value));

        let int_family =
            self.declare_concept("IntFamily", ConceptRule::Union(vec![int_scalar, int_vector]));
        let float_family = self.declare_concept(
            "FloatFamily",
            ConceptRule::Union(vec![float_scalar, float_vector]),
        );
        let bool_family = self.declare_concept(
            "BoolFamily",
            ConceptRule::AnyOf(vec![b.bool_, b.bool2, b.bool3, b.bool4]),
        );

        let arithmetic_family = self.declare_concept(
            "ArithmeticFamily",
            ConceptRule::Union(vec![int_family, float_family]),
        );
        let arithmetic_vector_family = self.declare_concept(
            "ArithmeticVectorFamily",
            ConceptRule::Union(vec![int_vector, float_vector]),
        );

        let matrix_family =
            self.declare_concept("MatrixFamily", ConceptRule::Class(TypeClass::Matrix));

        let buffer_family =
            self.declare_concept("BufferFamily", ConceptRule::Class(TypeClass::Buffer));
        let byte_buffer_family =
            self.declare_concept("ByteBufferFamily", ConceptRule::Class(TypeClass::ByteBuffer));
        let _structured_buffer_family = self.declare_concept(
            "StructuredBufferFamily",
            ConceptRule::Class(TypeClass::StructuredBuffer),
        );
        let int_buffer_family = self.declare_concept(
            "IntBufferFamily",
            ConceptRule::StructuredBufferOf(vec![b.int_, b.uint, b.int64, b.uint64]),
        );
        let int_shared_array_family = self.declare_concept(
            "IntSharedArrayFamily",
            ConceptRule::SharedArrayOf(vec![b.int_, b.uint, b.int64, b.uint64]),
        );
        let _atomic_operable_family = self.declare_concept(
            "AtomicOperableFamily",
            ConceptRule::Union(vec![int_buffer_family, int_shared_array_family]),
        );

        let sampler_family =
            self.declare_concept("SamplerFamily", ConceptRule::Class(TypeClass::Sampler));
        let texture_family =
            self.declare_concept("TextureFamily", ConceptRule::Class(TypeClass::Texture));
        let texture2d_family =
            self.declare_concept("Texture2DFamily", ConceptRule::Class(TypeClass::Texture2D));
        let _float_texture2d_family = self.declare_concept(
            "FloatTexture2DFamily",
            ConceptRule::Texture2DOf(vec![b.float]),
        );
        let _float_texture3d_family = self.declare_concept(
            "FloatTexture3DFamily",
            ConceptRule::Texture3DOf(vec![b.float]),
        );

        let ray_query_family =
            self.declare_concept("RayQueryFamily", ConceptRule::Class(TypeClass::RayQuery));
        let accel_family = self.declare_concept("AccelFamily", ConceptRule::Class(TypeClass::Accel));

        let one_value = [value_family];
        let one_arithmetic = [arithmetic_family];
        let two_arithmetic = [arithmetic_family; 2];
        let three_arithmetic = [arithmetic_family; 3];
        let one_arithmetic_vec = [arithmetic_vector_family];
        let one_bool = [bool_family];
        let one_int = [int_family];
        let one_float = [float_family];
        let two_float = [float_family; 2];
        let three_float = [float_family; 3];
        let one_float_vec = [float_vector];
        let two_float_vec = [float_vector; 2];
        let two_float3 = [float_vector3d; 2];
        let three_float3 = [float_vector3d; 3];
        let one_matrix = [matrix_family];

        self.intrinsic_fn("ABS", "abs", ReturnRule::FirstArg, &one_arithmetic);
        self.intrinsic_fn("MIN", "min", ReturnRule::FirstArg, &two_arithmetic);
        self.intrinsic_fn("MAX", "max", ReturnRule::FirstArg, &two_arithmetic);
        self.intrinsic_fn("CLAMP", "clamp", ReturnRule::FirstArg, &three_arithmetic);
        self.intrinsic_fn("LERP", "lerp", ReturnRule::FirstArg, &three_arithmetic);

        self.intrinsic_fn("ALL", "all", ReturnRule::Fixed(b.bool_), &one_bool);
        self.intrinsic_fn("ANY", "any", ReturnRule::Fixed(b.bool_), &one_bool);

        self.intrinsic_fn("CLZ", "clz", ReturnRule::FirstArg, &one_int);
        self.intrinsic_fn("CTZ", "ctz", ReturnRule::FirstArg, &one_int);
        self.intrinsic_fn("POPCOUNT", "popcount", ReturnRule::FirstArg, &one_int);
        self.intrinsic_fn("REVERSE", "reverse", ReturnRule::FirstArg, &one_int);

        for (key, name) in [
            ("SIN", "sin"),
            ("SINH", "sinh"),
            ("COS", "cos"),
            ("COSH", "cosh"),
            ("ATAN", "atan"),
            ("ATANH", "atanh"),
            ("TAN", "tan"),
            ("TANH", "tanh"),
            ("ACOS", "acos"),
            ("ACOSH", "acosh"),
            ("ASIN", "asin"),
            ("ASINH", "asinh"),
            ("EXP", "exp"),
            ("EXP2", "exp2"),
            ("EXP10", "exp10"),
            ("LOG", "log"),
            ("LOG2", "log2"),
            ("LOG10", "log10"),
            ("SQRT", "sqrt"),
            ("RSQRT", "rsqrt"),
            ("CEIL", "ceil"),
            ("FLOOR", "floor"),
            ("FRACT", "fract"),
            ("TRUNC", "trunc"),
            ("ROUND", "round"),
            ("SATURATE", "saturate"),
            ("DDX", "ddx"),
            ("DDY", "ddy"),
        ] {
            self.intrinsic_fn(key, name, ReturnRule::FirstArg, &one_float);
        }
        self.intrinsic_fn("LENGTH", "length", ReturnRule::Fixed(b.float), &one_float);
        self.intrinsic_fn("ISINF", "is_inf", ReturnRule::BoolVecMatchingDim, &one_float);
        self.intrinsic_fn("ISNAN", "is_nan", ReturnRule::BoolVecMatchingDim, &one_float);

        self.intrinsic_fn("POW", "pow", ReturnRule::FirstArg, &two_float);
        self.intrinsic_fn("COPYSIGN", "copysign", ReturnRule::FirstArg, &two_float);
        self.intrinsic_fn("ATAN2", "atan2", ReturnRule::FirstArg, &two_float);
        self.intrinsic_fn("STEP", "step", ReturnRule::FirstArg, &two_float);

        self.intrinsic_fn("FMA", "fma", ReturnRule::FirstArg, &three_float);
        self.intrinsic_fn("SMOOTHSTEP", "smoothstep", ReturnRule::FirstArg, &three_float);

        self.intrinsic_fn("NORMALIZE", "normalize", ReturnRule::FirstArg, &one_float_vec);
        self.intrinsic_fn(
            "LENGTH_SQUARED",
            "length_squared",
            ReturnRule::VectorElement { arg: 0 },
            &one_float_vec,
        );

        self.intrinsic_fn("DOT", "dot", ReturnRule::VectorElement { arg: 0 }, &two_float_vec);
        self.intrinsic_fn("CROSS", "cross", ReturnRule::FirstArg, &two_float_vec);

        self.intrinsic_fn(
            "FACEFORWARD",
            "faceforward",
            ReturnRule::Fixed(b.float3),
            &three_float3,
        );
        self.intrinsic_fn("REFLECT", "reflect", ReturnRule::Fixed(b.float3), &two_float3);

        self.intrinsic_fn("TRANSPOSE", "transpose", ReturnRule::FirstArg, &one_matrix);
        self.intrinsic_fn("DETERMINANT", "determinant", ReturnRule::FirstArg, &one_matrix);
        self.intrinsic_fn("INVERSE", "inverse", ReturnRule::FirstArg, &one_matrix);

        let select_params = [value_family, value_family, bool_family];
        self.intrinsic_fn("SELECT", "select", ReturnRule::FirstArg, &select_params);

        let buffer_read_params = [buffer_family, int_scalar];
        self.intrinsic_fn(
            "BUFFER_READ",
            "buffer_read",
            ReturnRule::BufferElement { arg: 0 },
            &buffer_read_params,
        );
        let buffer_write_params = [buffer_family, int_scalar, value_family];
        self.intrinsic_fn(
            "BUFFER_WRITE",
            "buffer_write",
            ReturnRule::Fixed(b.void_),
            &buffer_write_params,
        );

        // The typed Load<T> resolves through the call-site return override
        let byte_load_params = [byte_buffer_family, int_scalar];
        self.intrinsic_fn(
            "BYTE_BUFFER_READ",
            "byte_buffer_read",
            ReturnRule::Fixed(b.void_),
            &byte_load_params,
        );
        self.intrinsic_fn(
            "BYTE_BUFFER_LOAD",
            "byte_buffer_load",
            ReturnRule::Fixed(b.uint),
            &byte_load_params,
        );
        self.intrinsic_fn(
            "BYTE_BUFFER_LOAD2",
            "byte_buffer_load2",
            ReturnRule::Fixed(b.uint2),
            &byte_load_params,
        );
        self.intrinsic_fn(
            "BYTE_BUFFER_LOAD3",
            "byte_buffer_load3",
            ReturnRule::Fixed(b.uint3),
            &byte_load_params,
        );
        self.intrinsic_fn(
            "BYTE_BUFFER_LOAD4",
            "byte_buffer_load4",
            ReturnRule::Fixed(b.uint4),
            &byte_load_params,
        );

        let byte_write_params = [byte_buffer_family, int_scalar, value_family];
        self.intrinsic_fn(
            "BYTE_BUFFER_WRITE",
            "byte_buffer_write",
            ReturnRule::Fixed(b.void_),
            &byte_write_params,
        );
        let byte_store_params = [byte_buffer_family, int_scalar, int_family];
        for (key, name) in [
            ("BYTE_BUFFER_STORE", "byte_buffer_store"),
            ("BYTE_BUFFER_STORE2", "byte_buffer_store2"),
            ("BYTE_BUFFER_STORE3", "byte_buffer_store3"),
            ("BYTE_BUFFER_STORE4", "byte_buffer_store4"),
        ] {
            self.intrinsic_fn(key, name, ReturnRule::Fixed(b.void_), &byte_store_params);
        }

        // The atomic destination is the element lvalue, so all operands are
        // plain values here
        let atomic_params = [value_family, value_family, value_family];
        let compare_store_params = [value_family, value_family, value_family];
        let compare_exchange_params = [value_family; 4];
        for key in [
            "InterlockedExchange",
            "InterlockedAdd",
            "InterlockedAnd",
            "InterlockedOr",
            "InterlockedXor",
            "InterlockedMin",
            "InterlockedMax",
        ] {
            self.intrinsic_fn(key, key, ReturnRule::Fixed(b.void_), &atomic_params);
        }
        self.intrinsic_fn(
            "InterlockedCompareExchange",
            "InterlockedCompareExchange",
            ReturnRule::Fixed(b.void_),
            &compare_exchange_params,
        );
        self.intrinsic_fn(
            "InterlockedCompareStore",
            "InterlockedCompareStore",
            ReturnRule::Fixed(b.void_),
            &compare_store_params,
        );

        let texture_read_params = [texture_family, int_vector];
        self.intrinsic_fn(
            "TEXTURE_READ",
            "texture_read",
            ReturnRule::TextureElement { arg: 0 },
            &texture_read_params,
        );
        let texture_write_params = [texture_family, int_vector, vector4d];
        self.intrinsic_fn(
            "TEXTURE_WRITE",
            "texture_write",
            ReturnRule::Fixed(b.void_),
            &texture_write_params,
        );
        let texture_size_params = [texture_family];
        self.intrinsic_fn(
            "TEXTURE_SIZE",
            "texture_size",
            ReturnRule::Fixed(b.uint3),
            &texture_size_params,
        );

        let sample2d_params = [sampler_family, texture2d_family, float_vector];
        self.intrinsic_fn(
            "SAMPLE2D",
            "sample2d",
            ReturnRule::Vec4OfTextureElement { arg: 1 },
            &sample2d_params,
        );

        let one_ray_query = [ray_query_family];
        self.intrinsic_fn(
            "RAY_QUERY_PROCEED",
            "ray_query_proceed",
            ReturnRule::Fixed(b.bool_),
            &one_ray_query,
        );
        for (key, name, ret) in [
            ("RAY_QUERY_COMMITTED_STATUS", "ray_query_committed_status", b.uint),
            (
                "RAY_QUERY_COMMITTED_TRIANGLE_BARYCENTRICS",
                "ray_query_committed_triangle_bary",
                b.float2,
            ),
            (
                "RAY_QUERY_COMMITTED_PRIMITIVE_INDEX",
                "ray_query_committed_primitive_index",
                b.uint,
            ),
            (
                "RAY_QUERY_COMMITTED_INSTANCE_ID",
                "ray_query_committed_instance_id",
                b.uint,
            ),
            (
                "RAY_QUERY_COMMITTED_PROCEDURAL_DISTANCE",
                "ray_query_committed_procedural_distance",
                b.float,
            ),
            ("RAY_QUERY_COMMITTED_RAY_T", "ray_query_committed_ray_t", b.float),
            ("RAY_QUERY_CANDIDATE_STATUS", "ray_query_candidate_status", b.uint),
            (
                "RAY_QUERY_CANDIDATE_TRIANGLE_BARYCENTRICS",
                "ray_query_candidate_triangle_bary",
                b.float2,
            ),
            (
                "RAY_QUERY_CANDIDATE_PRIMITIVE_INDEX",
                "ray_query_candidate_primitive_index",
                b.uint,
            ),
            (
                "RAY_QUERY_CANDIDATE_INSTANCE_ID",
                "ray_query_candidate_instance_id",
                b.uint,
            ),
            (
                "RAY_QUERY_CANDIDATE_PROCEDURAL_DISTANCE",
                "ray_query_candidate_procedural_distance",
                b.float,
            ),
            (
                "RAY_QUERY_CANDIDATE_TRIANGLE_RAY_T",
                "ray_query_candidate_triangle_ray_t",
                b.float,
            ),
            ("RAY_QUERY_WORLD_RAY_ORIGIN", "ray_query_world_ray_origin", b.float3),
            (
                "RAY_QUERY_WORLD_RAY_DIRECTION",
                "ray_query_world_ray_direction",
                b.float3,
            ),
            ("RAY_QUERY_COMMIT_TRIANGLE", "ray_query_commit_triangle", b.bool_),
            ("RAY_QUERY_TERMINATE", "ray_query_terminate", b.bool_),
        ] {
            self.intrinsic_fn(key, name, ReturnRule::Fixed(ret), &one_ray_query);
        }

        let trace_ray_inline_params = [ray_query_family, accel_family, int_scalar, value_family];
        self.intrinsic_fn(
            "RAY_QUERY_TRACE_RAY_INLINE",
            "ray_query_trace_ray_inline",
            ReturnRule::Fixed(b.void_),
            &trace_ray_inline_params,
        );
        let commit_procedural_params = [float_scalar];
        self.intrinsic_fn(
            "RAY_QUERY_COMMIT_PROCEDURAL",
            "ray_query_commit_procedural",
            ReturnRule::Fixed(b.void_),
            &commit_procedural_params,
        );

        for key in [
            "AllMemoryBarrier",
            "AllMemoryBarrierWithGroupSync",
            "GroupMemoryBarrier",
            "GroupMemoryBarrierWithGroupSync",
            "DeviceMemoryBarrier",
            "DeviceMemoryBarrierWithGroupSync",
        ] {
            self.intrinsic_fn(key, key, ReturnRule::Fixed(b.void_), &[]);
        }

        let read_lane_at = [value_family, int_scalar];
        self.intrinsic_fn(
            "QuadReadAcrossDiagonal",
            "QuadReadAcrossDiagonal",
            ReturnRule::FirstArg,
            &one_value,
        );
        self.intrinsic_fn("QuadReadLaneAt", "QuadReadLaneAt", ReturnRule::FirstArg, &read_lane_at);
        self.intrinsic_fn("QuadReadAcrossX", "QuadReadAcrossX", ReturnRule::FirstArg, &one_value);
        self.intrinsic_fn("QuadReadAcrossY", "QuadReadAcrossY", ReturnRule::FirstArg, &one_value);

        self.intrinsic_fn(
            "WaveActiveAllEqual",
            "WaveActiveAllEqual",
            ReturnRule::BoolVecMatchingDim,
            &one_arithmetic_vec,
        );
        self.intrinsic_fn("WaveActiveBitAnd", "WaveActiveBitAnd", ReturnRule::FirstArg, &one_int);
        self.intrinsic_fn("WaveActiveBitOr", "WaveActiveBitOr", ReturnRule::FirstArg, &one_int);
        self.intrinsic_fn("WaveActiveBitXor", "WaveActiveBitXor", ReturnRule::FirstArg, &one_int);
        self.intrinsic_fn(
            "WaveActiveCountBits",
            "WaveActiveCountBits",
            ReturnRule::Fixed(b.uint),
            &one_bool,
        );
        self.intrinsic_fn("WaveActiveMax", "WaveActiveMax", ReturnRule::FirstArg, &one_arithmetic);
        self.intrinsic_fn("WaveActiveMin", "WaveActiveMin", ReturnRule::FirstArg, &one_arithmetic);
        self.intrinsic_fn(
            "WaveActiveProduct",
            "WaveActiveProduct",
            ReturnRule::FirstArg,
            &one_arithmetic,
        );
        self.intrinsic_fn("WaveActiveSum", "WaveActiveSum", ReturnRule::FirstArg, &one_arithmetic);
        self.intrinsic_fn(
            "WaveActiveAllTrue",
            "WaveActiveAllTrue",
            ReturnRule::Fixed(b.bool_),
            &one_bool,
        );
        self.intrinsic_fn(
            "WaveActiveAnyTrue",
            "WaveActiveAnyTrue",
            ReturnRule::Fixed(b.bool_),
            &one_bool,
        );
        self.intrinsic_fn(
            "WaveActiveBallot",
            "WaveActiveBallot",
            ReturnRule::Fixed(b.uint4),
            &one_bool,
        );
        self.intrinsic_fn("WaveGetLaneCount", "WaveGetLaneCount", ReturnRule::Fixed(b.uint), &[]);
        self.intrinsic_fn("WaveGetLaneIndex", "WaveGetLaneIndex", ReturnRule::Fixed(b.uint), &[]);
        self.intrinsic_fn("WaveIsFirstLane", "WaveIsFirstLane", ReturnRule::Fixed(b.bool_), &[]);
        self.intrinsic_fn(
            "WavePrefixCountBits",
            "WavePrefixCountBits",
            ReturnRule::Fixed(b.uint),
            &one_bool,
        );
        self.intrinsic_fn(
            "WavePrefixProduct",
            "WavePrefixProduct",
            ReturnRule::FirstArg,
            &one_arithmetic,
        );
        self.intrinsic_fn("WavePrefixSum", "WavePrefixSum", ReturnRule::FirstArg, &one_arithmetic);
        // WaveReadLaneFirst<T> resolves through the call-site return override
        self.intrinsic_fn(
            "WaveReadLaneFirst",
            "WaveReadLaneFirst",
            ReturnRule::Fixed(b.void_),
            &[],
        );
        self.intrinsic_fn("WaveReadLaneAt", "WaveReadLaneAt", ReturnRule::Fixed(b.void_), &one_int);
    }
}
