// End-to-end HLSL emission scenarios
//
// Expected fragments compare after whitespace normalization, so layout
// changes do not invalidate the semantic checks.

use slc_ast::{
    ArrayFlags, Attr, BinaryOp, BufferFlags, ConstantValue, Module, ModuleDatabase, Qualifier,
    RayQueryFlags, SemanticType, ShaderStage, TextureFlags,
};
use slc_codegen::{HlslGenerator, ShaderBackend};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn assert_contains(haystack: &str, needle: &str) {
    let h = normalize(haystack);
    let n = normalize(needle);
    assert!(h.contains(&n), "expected output to contain `{}`\n---\n{}", n, haystack);
}

/// Compute entry storing `a[i] + b[i]` back into `a[i]`
fn build_scalar_add(db: &mut ModuleDatabase) -> Module {
    let mut m = Module::new(db);
    let b = m.builtins;

    let rw = m.structured_buffer(b.uint, BufferFlags::READ_WRITE);
    let ro = m.structured_buffer(b.uint, BufferFlags::READ_ONLY);
    let a_var = m.declare_global_resource(rw, "a").unwrap();
    m.add_decl_attr(
        a_var,
        Attr::ResourceBind {
            group: Some(0),
            binding: Some(0),
        },
    );
    let b_var = m.declare_global_resource(ro, "b").unwrap();
    m.add_decl_attr(
        b_var,
        Attr::ResourceBind {
            group: Some(0),
            binding: Some(1),
        },
    );

    let tid = m.declare_param(Qualifier::None, b.uint3, "tid").unwrap();
    m.add_decl_attr(tid, Attr::Semantic(SemanticType::ThreadID));

    let a_ref = m.decl_ref(a_var);
    let b_ref = m.decl_ref(b_var);
    let tid_ref = m.decl_ref(tid);
    let tid_x = m.swizzle(tid_ref, &[0]).unwrap();

    let lhs = m.access(a_ref, tid_x);
    let load_a = m.access(a_ref, tid_x);
    let load_b = m.access(b_ref, tid_x);
    let sum = m.binary(BinaryOp::Add, load_a, load_b);
    let assign = m.binary(BinaryOp::Assign, lhs, sum);
    let store = m.expr_stmt(assign);
    let body = m.block(&[store]);

    let entry = m.declare_function("main", b.void_, &[tid], body).unwrap();
    m.add_decl_attr(entry, Attr::Stage(ShaderStage::Compute));
    m.add_decl_attr(entry, Attr::KernelSize { x: 8, y: 1, z: 1 });
    m
}

#[test]
fn scalar_add_entry() {
    init_logging();
    let mut db = ModuleDatabase::new();
    let m = build_scalar_add(&mut db);
    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();

    assert_contains(
        &out,
        "[[vk::binding(0, 0)]] RWStructuredBuffer<uint> a : register(u0, space0);",
    );
    assert_contains(
        &out,
        "[[vk::binding(1, 0)]] StructuredBuffer<uint> b : register(t1, space0);",
    );
    assert_contains(
        &out,
        "[shader(\"compute\")] [numthreads(8, 1, 1)] void main(uint3 tid : SV_DispatchThreadID) {",
    );
    assert_contains(&out, "a[tid.x] = a[tid.x] + b[tid.x];");
    assert!(!db.diagnostics.has_fatal());
}

#[test]
fn generated_text_is_deterministic() {
    let mut db1 = ModuleDatabase::new();
    let m1 = build_scalar_add(&mut db1);
    let out1 = HlslGenerator::new().generate(&m1, &mut db1.diagnostics).unwrap();
    let out1_again = HlslGenerator::new().generate(&m1, &mut db1.diagnostics).unwrap();
    assert_eq!(out1, out1_again);

    let mut db2 = ModuleDatabase::new();
    let m2 = build_scalar_add(&mut db2);
    let out2 = HlslGenerator::new().generate(&m2, &mut db2.diagnostics).unwrap();
    assert_eq!(out1, out2);
}

#[test]
fn matrix_vector_multiply_rewrites_to_mul() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let (m_stmt, m_var) = m.variable(Qualifier::None, b.float4x4, "M", None).unwrap();
    let (v_stmt, v_var) = m.variable(Qualifier::None, b.float4, "v", None).unwrap();
    let m_ref = m.decl_ref(m_var);
    let v_ref = m.decl_ref(v_var);

    let product = m.binary(BinaryOp::Mul, m_ref, v_ref);
    let (r_stmt, r_var) = m
        .variable(Qualifier::None, b.float4, "r", Some(product))
        .unwrap();

    let r_ref = m.decl_ref(r_var);
    let compound = m.binary(BinaryOp::MulAssign, r_ref, m_ref);
    let compound_stmt = m.expr_stmt(compound);

    let body = m.block(&[m_stmt, v_stmt, r_stmt, compound_stmt]);
    m.declare_function("apply", b.void_, &[], body).unwrap();

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "float4 r = mul(M, v);");
    assert_contains(&out, "r = mul(r, M);");
}

#[test]
fn bindless_array_indexing() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    // A regular buffer occupies the shared space first
    let buf_ty = m.structured_buffer(b.float, BufferFlags::READ_ONLY);
    let buf = m.declare_global_resource(buf_ty, "shade").unwrap();
    m.add_decl_attr(buf, Attr::ResourceBind { group: None, binding: None });

    let tex = m.texture2d(b.float, TextureFlags::READ_ONLY);
    let bindless_ty = m.array(tex, 0, ArrayFlags::empty());
    let t = m.declare_global_resource(bindless_ty, "t").unwrap();
    m.add_decl_attr(t, Attr::ResourceBind { group: None, binding: None });

    let idx = m.declare_param(Qualifier::None, b.uint, "idx").unwrap();
    let t_ref = m.decl_ref(t);
    let idx_ref = m.decl_ref(idx);
    let pick = m.access(t_ref, idx_ref);
    let (pick_stmt, _) = m
        .variable(Qualifier::None, tex, "chosen", Some(pick))
        .unwrap();
    let body = m.block(&[pick_stmt]);
    m.declare_function("lookup", b.void_, &[idx], body).unwrap();

    let mut gen = HlslGenerator::new();
    let out = gen.generate(&m, &mut db.diagnostics).unwrap();

    assert_contains(&out, "t[NonUniformResourceIndex(idx)]");
    assert_contains(&out, "Texture2D<float4> t[]");

    // The bindless array owns its space
    let bindings = gen.bindings();
    let shared = bindings.get(&buf).unwrap();
    let bindless = bindings.get(&t).unwrap();
    assert_ne!(shared.space, bindless.space);
}

#[test]
fn ray_query_type_spelling() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let rq = m.ray_query(RayQueryFlags::FORCE_OPAQUE | RayQueryFlags::CULL_TRIANGLE);
    let (q_stmt, _) = m.variable(Qualifier::None, rq, "q", None).unwrap();
    let body = m.block(&[q_stmt]);
    m.declare_function("trace", b.void_, &[], body).unwrap();

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(
        &out,
        "RayQuery<RAY_FLAG_NONE | RAY_FLAG_FORCE_OPAQUE | RAY_FLAG_CULL_TRIANGLES> q;",
    );
}

#[test]
fn array_constructor_uses_helper() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let arr3 = m.array(b.float, 3, ArrayFlags::empty());
    let one = m.constant(ConstantValue::Int(1));
    let two = m.constant(ConstantValue::Int(2));
    let three = m.constant(ConstantValue::Int(3));
    let first = m.construct(arr3, &[one, two, three]);
    let (first_stmt, _) = m.variable(Qualifier::None, arr3, "w", Some(first)).unwrap();

    // A second use of the same length must not duplicate the helper
    let second = m.construct(arr3, &[three, two, one]);
    let (second_stmt, _) = m.variable(Qualifier::None, arr3, "z", Some(second)).unwrap();

    let body = m.block(&[first_stmt, second_stmt]);
    m.declare_function("fill", b.void_, &[], body).unwrap();

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "array<float, 3> w = make_array3<float, 3>(1, 2, 3);");

    let definitions = out.matches("array<T, N> make_array3(T a0").count();
    assert_eq!(definitions, 1);
}

#[test]
fn fragment_entry_gets_sv_target() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let half = m.constant(ConstantValue::float(0.5));
    let color = m.construct(b.float4, &[half]);
    let ret = m.return_stmt(Some(color));
    let body = m.block(&[ret]);
    let entry = m.declare_function("frag", b.float4, &[], body).unwrap();
    m.add_decl_attr(entry, Attr::Stage(ShaderStage::Fragment));

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "[shader(\"pixel\")] float4 frag() : SV_Target {");
    // Single-scalar vector construction broadens to all lanes
    assert_contains(&out, "return float4(0.5f, 0.5f, 0.5f, 0.5f);");
}

#[test]
fn invalid_semantic_is_fatal_and_produces_no_output() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    // SV_DispatchThreadID makes no sense on a vertex input
    let tid = m.declare_param(Qualifier::None, b.uint3, "tid").unwrap();
    m.add_decl_attr(tid, Attr::Semantic(SemanticType::ThreadID));
    let body = m.block(&[]);
    let entry = m.declare_function("vs", b.void_, &[tid], body).unwrap();
    m.add_decl_attr(entry, Attr::Stage(ShaderStage::Vertex));

    let mut sinkhole = String::new();
    let err = HlslGenerator::new()
        .generate_into(&m, &mut sinkhole, &mut db.diagnostics)
        .unwrap_err();
    assert!(matches!(err, slc_codegen::CodegenError::InvalidSemantic { .. }));
    assert!(sinkhole.is_empty(), "failed run must not produce partial output");
    assert!(db.diagnostics.has_fatal());
}

#[test]
fn group_shared_and_global_constant_emission() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let shared_ty = m.array(b.uint, 64, ArrayFlags::SHARED);
    m.declare_group_shared(shared_ty, "tile", None).unwrap();

    let limit = m.constant(ConstantValue::UInt(1024));
    m.declare_global_constant(b.uint, "kLimit", Some(limit)).unwrap();

    let body = m.block(&[]);
    m.declare_function("noop", b.void_, &[], body).unwrap();

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "groupshared array<uint, 64> tile;");
    assert_contains(&out, "static const uint kLimit = 1024u;");
}

#[test]
fn constructor_lowering_synthesizes_new() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let fx = m.declare_field("x", b.float).unwrap();
    let fy = m.declare_field("y", b.float).unwrap();
    let point = m.declare_structure("Point", &[fx, fy]).unwrap();

    let px = m.declare_param(Qualifier::None, b.float, "px").unwrap();
    let py = m.declare_param(Qualifier::None, b.float, "py").unwrap();
    let this_expr = m.this_expr(point);
    let x_field = m.field_expr(this_expr, fx);
    let px_ref = m.decl_ref(px);
    let set_x = m.binary(BinaryOp::Assign, x_field, px_ref);
    let set_x_stmt = m.expr_stmt(set_x);
    let y_field = m.field_expr(this_expr, fy);
    let py_ref = m.decl_ref(py);
    let set_y = m.binary(BinaryOp::Assign, y_field, py_ref);
    let set_y_stmt = m.expr_stmt(set_y);
    let ctor_body = m.block(&[set_x_stmt, set_y_stmt]);
    m.declare_constructor(point, "init", &[px, py], ctor_body).unwrap();

    // A construct call site that should lower to Point::New
    let one = m.constant(ConstantValue::float(1.0));
    let two = m.constant(ConstantValue::float(2.0));
    let built = m.construct(point, &[one, two]);
    let (built_stmt, _) = m.variable(Qualifier::None, point, "p", Some(built)).unwrap();
    let body = m.block(&[built_stmt]);
    m.declare_function("makePoint", b.void_, &[], body).unwrap();

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "struct Point {");
    assert_contains(&out, "void init(float px, float py) {");
    assert_contains(&out, "static Point New(float px, float py) {");
    assert_contains(&out, "Point _this = (Point)0;");
    assert_contains(&out, "_this.init(px, py);");
    assert_contains(&out, "return _this;");
    assert_contains(&out, "Point p = Point::New(1.0f, 2.0f);");
}

#[test]
fn stmt_attributes_precede_statement() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let cond = m.constant(ConstantValue::Bool(true));
    let inner = m.block(&[]);
    let loop_stmt = m.while_stmt(cond, inner);
    m.add_stmt_attr(loop_stmt, Attr::Loop);
    m.add_stmt_attr(loop_stmt, Attr::Unroll { count: Some(4) });
    let body = m.block(&[loop_stmt]);
    m.declare_function("spin", b.void_, &[], body).unwrap();

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "[loop][unroll(4)] while (true) {");
}

#[test]
fn control_flow_and_namespaces() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let note = m.comment("accumulate until the counter runs out");
    let zero = m.constant(ConstantValue::Int(0));
    let ten = m.constant(ConstantValue::Int(10));
    let one = m.constant(ConstantValue::Int(1));

    let (i_stmt, i_var) = m.variable(Qualifier::None, b.int_, "i", Some(zero)).unwrap();
    let i_ref = m.decl_ref(i_var);
    let cond = m.binary(BinaryOp::Lt, i_ref, ten);
    let bump = m.binary(BinaryOp::AddAssign, i_ref, one);
    let bump_stmt = m.expr_stmt(bump);

    let two = m.constant(ConstantValue::Int(2));
    let break_stmt = m.break_stmt();
    let break_block = m.block(&[break_stmt]);
    let is_two = m.case(two, break_block);
    let continue_stmt = m.continue_stmt();
    let continue_block = m.block(&[continue_stmt]);
    let fallback = m.default_case(continue_block);
    let switch = m.switch(i_ref, &[is_two, fallback]);

    let loop_body = m.block(&[switch]);
    let loop_stmt = m.for_stmt(Some(i_stmt), Some(cond), Some(bump_stmt), loop_body);
    let body = m.block(&[note, loop_stmt]);
    let walk = m.declare_function("walk", b.void_, &[], body).unwrap();

    let util = m.declare_namespace("util", None).unwrap();
    m.add_namespace_function(util, walk);

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "namespace util {");
    assert_contains(&out, "// accumulate until the counter runs out");
    assert_contains(&out, "for (int i = 0; i < 10; i += 1) {");
    assert_contains(&out, "switch (i) {");
    assert_contains(&out, "case 2: {");
    assert_contains(&out, "break;");
    assert_contains(&out, "default: {");
    assert_contains(&out, "continue;");
}

#[test]
fn stage_inout_struct_fields_get_semantics() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let pos = m.declare_field("position", b.float4).unwrap();
    let uv = m.declare_field("uv", b.float2).unwrap();
    m.add_decl_attr(uv, Attr::Interpolation(slc_ast::InterpolationMode::linear));
    let varyings = m.declare_structure("Varyings", &[pos, uv]).unwrap();
    m.add_type_attr(varyings, Attr::StageInout);

    let body = m.block(&[]);
    m.declare_function("noop", b.void_, &[], body).unwrap();

    let out = HlslGenerator::new().generate(&m, &mut db.diagnostics).unwrap();
    assert_contains(&out, "float4 position : position;");
    assert_contains(&out, "linear float2 uv : uv;");
}
