// Binding allocator laws over whole modules

use slc_ast::{
    ArrayFlags, Attr, BufferFlags, DeclId, Module, ModuleDatabase, TextureFlags,
};
use slc_codegen::{allocate_bindings, CodegenError};

fn bound_buffer(m: &mut Module, name: &str, group: Option<u32>, binding: Option<u32>) -> DeclId {
    let b = m.builtins;
    let ty = m.structured_buffer(b.float, BufferFlags::READ_ONLY);
    let var = m.declare_global_resource(ty, name).unwrap();
    m.add_decl_attr(var, Attr::ResourceBind { group, binding });
    var
}

fn bindless_textures(m: &mut Module, name: &str) -> DeclId {
    let b = m.builtins;
    let tex = m.texture2d(b.float, TextureFlags::READ_ONLY);
    let ty = m.array(tex, 0, ArrayFlags::empty());
    let var = m.declare_global_resource(ty, name).unwrap();
    m.add_decl_attr(var, Attr::ResourceBind { group: None, binding: None });
    var
}

#[test]
fn unconstrained_resources_fill_a_shared_space() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);

    let vars: Vec<DeclId> = (0..4)
        .map(|i| bound_buffer(&mut m, &format!("buf{}", i), None, None))
        .collect();

    let bindings = allocate_bindings(&m, &mut db.diagnostics).unwrap();
    let space = bindings[&vars[0]].space;
    for (i, var) in vars.iter().enumerate() {
        let binding = bindings[var];
        assert_eq!(binding.space, space);
        assert_eq!(binding.register, i as u32);
    }
}

#[test]
fn explicit_reservation_is_never_reused() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);

    let fixed = bound_buffer(&mut m, "fixed", Some(3), Some(5));
    let autos: Vec<DeclId> = (0..6)
        .map(|i| bound_buffer(&mut m, &format!("auto{}", i), Some(3), None))
        .collect();

    let bindings = allocate_bindings(&m, &mut db.diagnostics).unwrap();
    assert_eq!(bindings[&fixed].space, 3);
    assert_eq!(bindings[&fixed].register, 5);

    let registers: Vec<u32> = autos.iter().map(|v| bindings[v].register).collect();
    assert_eq!(registers, vec![0, 1, 2, 3, 4, 6]);
    for var in &autos {
        assert_eq!(bindings[var].space, 3);
    }
}

#[test]
fn overlapping_explicit_registers_are_fatal() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);

    bound_buffer(&mut m, "first", Some(1), Some(2));
    bound_buffer(&mut m, "second", Some(1), Some(2));

    let err = allocate_bindings(&m, &mut db.diagnostics).unwrap_err();
    assert!(matches!(err, CodegenError::BindingConflict(_)));
}

#[test]
fn push_constant_space_must_be_isolated() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    let fx = m.declare_field("scale", b.float).unwrap();
    let params = m.declare_structure("Params", &[fx]).unwrap();
    let cbuf = m.constant_buffer(params);
    let push = m.declare_global_resource(cbuf, "params").unwrap();
    m.add_decl_attr(push, Attr::PushConstant);
    m.add_decl_attr(push, Attr::ResourceBind { group: Some(2), binding: None });

    // A regular resource lands in the push constant's space
    bound_buffer(&mut m, "intruder", Some(2), None);

    let err = allocate_bindings(&m, &mut db.diagnostics).unwrap_err();
    match err {
        CodegenError::BindingConflict(message) => {
            assert!(message.contains("push constant"), "{}", message);
            assert!(message.contains("intruder"), "{}", message);
        }
        other => unreachable!("unexpected error {:?}", other),
    }
}

#[test]
fn bindless_space_skips_occupied_spaces() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);

    let bindless = bindless_textures(&mut m, "textures");
    bound_buffer(&mut m, "explicit", Some(1), None);

    // The fresh space for the bindless array must avoid the explicitly
    // claimed space 1
    let bindings = allocate_bindings(&m, &mut db.diagnostics).unwrap();
    assert_ne!(bindings[&bindless].space, 1);
}

#[test]
fn bindless_sharing_space_with_regular_is_fatal() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);

    let b = m.builtins;
    let tex = m.texture2d(b.float, TextureFlags::READ_ONLY);
    let ty = m.array(tex, 0, ArrayFlags::empty());
    let bindless = m.declare_global_resource(ty, "textures").unwrap();
    // Pin the bindless array into the same space as a regular resource
    m.add_decl_attr(bindless, Attr::ResourceBind { group: Some(4), binding: None });
    bound_buffer(&mut m, "intruder", Some(4), None);

    let err = allocate_bindings(&m, &mut db.diagnostics).unwrap_err();
    match err {
        CodegenError::BindingConflict(message) => {
            assert!(message.contains("bindless"), "{}", message);
        }
        other => unreachable!("unexpected error {:?}", other),
    }
}

#[test]
fn partial_register_request_warns_when_moved() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);

    // Two register requests without a space collide inside the shared space
    let first = bound_buffer(&mut m, "first", None, Some(0));
    let second = bound_buffer(&mut m, "second", None, Some(0));

    let bindings = allocate_bindings(&m, &mut db.diagnostics).unwrap();
    assert_eq!(bindings[&first].register, 0);
    assert_eq!(bindings[&first].space, bindings[&second].space);
    assert_ne!(bindings[&second].register, 0);
    assert_eq!(db.diagnostics.warning_count(), 1);
}

#[test]
fn unbound_globals_are_skipped() {
    let mut db = ModuleDatabase::new();
    let mut m = Module::new(&mut db);
    let b = m.builtins;

    // No ResourceBind attribute: left out of the table entirely
    let ty = m.structured_buffer(b.float, BufferFlags::READ_ONLY);
    let var = m.declare_global_resource(ty, "loose").unwrap();

    let bindings = allocate_bindings(&m, &mut db.diagnostics).unwrap();
    assert!(!bindings.contains_key(&var));
}
