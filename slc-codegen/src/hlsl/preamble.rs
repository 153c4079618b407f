// Compiled-in HLSL prelude blocks
//
// The helper functions mirror the intrinsic catalog: every callable the
// generator may reference by name has a definition here.

use crate::source::SourceBuilder;
use slc_ast::{Module, TypeKind};
use std::collections::BTreeSet;

pub const HLSL_HEADER: &str = r#"using uint64 = uint64_t;

template <typename T> T fract(T x) { return x - floor(x); }
template <typename T> float length_squared(T x) { return dot(x, x); }

template <typename T, uint64_t N> struct array { T data[N]; };
template <typename T> using Bindless = T[];

template <typename B, typename T> T atomic_fetch_add(B buffer, uint offset, T value) { T prev = 0; InterlockedAdd(buffer[offset], value, prev); return prev; }
template <typename G, typename T> T atomic_fetch_add(inout G shared_v, T value) { T prev = 0; InterlockedAdd(shared_v, value, prev); return prev; }
"#;

pub const HLSL_BUFFER_INTRINSICS: &str = r#"
template <typename T> T buffer_read(StructuredBuffer<T> buffer, uint index) { return buffer[index]; }
template <typename T> T buffer_read(RWStructuredBuffer<T> buffer, uint index) { return buffer[index]; }
template <typename T> void buffer_write(RWStructuredBuffer<T> buffer, uint index, T value) { buffer[index] = value; }

template <typename T> T byte_buffer_read(ByteAddressBuffer buffer, uint offset) { return buffer.Load<T>(offset); }
template <typename T> T byte_buffer_read(RWByteAddressBuffer buffer, uint offset) { return buffer.Load<T>(offset); }
template <typename T> void byte_buffer_write(RWByteAddressBuffer buffer, uint offset, T value) { buffer.Store<T>(offset, value); }
uint byte_buffer_load(ByteAddressBuffer buffer, uint offset) { return buffer.Load(offset); }
uint2 byte_buffer_load2(ByteAddressBuffer buffer, uint offset) { return buffer.Load2(offset); }
uint3 byte_buffer_load3(ByteAddressBuffer buffer, uint offset) { return buffer.Load3(offset); }
uint4 byte_buffer_load4(ByteAddressBuffer buffer, uint offset) { return buffer.Load4(offset); }
void byte_buffer_store(RWByteAddressBuffer buffer, uint offset, uint value) { buffer.Store(offset, value); }
void byte_buffer_store2(RWByteAddressBuffer buffer, uint offset, uint2 value) { buffer.Store2(offset, value); }
void byte_buffer_store3(RWByteAddressBuffer buffer, uint offset, uint3 value) { buffer.Store3(offset, value); }
void byte_buffer_store4(RWByteAddressBuffer buffer, uint offset, uint4 value) { buffer.Store4(offset, value); }
"#;

pub const HLSL_TEXTURE_INTRINSICS: &str = r#"
template <typename TEX, typename C> float4 texture_read(TEX tex, C coord) { return tex[coord]; }
template <typename TEX, typename C, typename V> void texture_write(TEX tex, C coord, V value) { tex[coord] = value; }
template <typename TEX> uint3 texture_size(TEX tex) { uint w, h; tex.GetDimensions(w, h); return uint3(w, h, 1); }
template <typename TEX> float4 sample2d(SamplerState s, TEX tex, float2 uv) { return tex.SampleLevel(s, uv, 0); }
"#;

pub const HLSL_RAY_INTRINSICS: &str = r#"
template <typename Q> bool ray_query_proceed(inout Q q) { return q.Proceed(); }
template <typename Q> uint ray_query_committed_status(inout Q q) { return (uint)q.CommittedStatus(); }
template <typename Q> float2 ray_query_committed_triangle_bary(inout Q q) { return q.CommittedTriangleBarycentrics(); }
template <typename Q> uint ray_query_committed_primitive_index(inout Q q) { return q.CommittedPrimitiveIndex(); }
template <typename Q> uint ray_query_committed_instance_id(inout Q q) { return q.CommittedInstanceID(); }
template <typename Q> float ray_query_committed_procedural_distance(inout Q q) { return q.CommittedRayT(); }
template <typename Q> float ray_query_committed_ray_t(inout Q q) { return q.CommittedRayT(); }
template <typename Q> uint ray_query_candidate_status(inout Q q) { return (uint)q.CandidateType(); }
template <typename Q> float2 ray_query_candidate_triangle_bary(inout Q q) { return q.CandidateTriangleBarycentrics(); }
template <typename Q> uint ray_query_candidate_primitive_index(inout Q q) { return q.CandidatePrimitiveIndex(); }
template <typename Q> uint ray_query_candidate_instance_id(inout Q q) { return q.CandidateInstanceID(); }
template <typename Q> float ray_query_candidate_procedural_distance(inout Q q) { return q.CandidateTriangleRayT(); }
template <typename Q> float ray_query_candidate_triangle_ray_t(inout Q q) { return q.CandidateTriangleRayT(); }
template <typename Q> float3 ray_query_world_ray_origin(inout Q q) { return q.WorldRayOrigin(); }
template <typename Q> float3 ray_query_world_ray_direction(inout Q q) { return q.WorldRayDirection(); }
template <typename Q> void ray_query_commit_triangle(inout Q q) { q.CommitNonOpaqueTriangleHit(); }
template <typename Q> void ray_query_commit_procedural(inout Q q, float distance) { q.CommitProceduralPrimitiveHit(distance); }
template <typename Q> void ray_query_terminate(inout Q q) { q.Abort(); }
template <typename Q, typename R> void ray_query_trace_ray_inline(inout Q q, RaytracingAccelerationStructure accel, uint mask, R ray) {
    RayDesc desc;
    desc.Origin = ray.origin;
    desc.Direction = ray.dir;
    desc.TMin = ray.tmin;
    desc.TMax = ray.tmax;
    q.TraceRayInline(accel, RAY_FLAG_NONE, mask, desc);
}
"#;

pub const HLSL_BITCAST: &str = r#"
template <typename To, typename From> To bit_cast(From v) { return (To)v; }
template <> float bit_cast<float, uint>(uint v) { return asfloat(v); }
template <> float bit_cast<float, int>(int v) { return asfloat(v); }
template <> uint bit_cast<uint, float>(float v) { return asuint(v); }
template <> int bit_cast<int, float>(float v) { return asint(v); }
"#;

/// Emit one pair of `make_arrayN` helpers per observed array length
pub fn emit_array_helpers(module: &Module, sb: &mut SourceBuilder) {
    let mut lengths = BTreeSet::new();
    for ty in module.array_types() {
        if let TypeKind::Array { count, .. } = module.type_decl(ty).kind {
            if count > 0 {
                lengths.insert(count);
            }
        }
    }

    for n in &lengths {
        let mut args = String::new();
        let mut assigns = String::new();
        for i in 0..*n {
            if i > 0 {
                args.push_str(", ");
            }
            args.push_str(&format!("T a{}", i));
            assigns.push_str(&format!("a.data[{}] = a{}; ", i, i));
        }
        sb.append(&format!(
            "template <typename T, uint64_t N> array<T, N> make_array{}({}) {{ array<T, N> a; {}return a; }}",
            n, args, assigns
        ));
        sb.endline();
        sb.append(&format!(
            "template <typename T, uint64_t N> array<T, N> make_array{}() {{ array<T, N> a; return a; }}",
            n
        ));
        sb.endline();
    }
    if !lengths.is_empty() {
        sb.endline();
    }
}
