use naga::valid::{Capabilities, ValidationFlags, Validator};
use sphere_engine::gpu_backend::{DISPLACE_WGSL, PROJECT_WGSL};

fn validate(src: &str) -> naga::Module {
    let module = naga::front::wgsl::parse_str(src).unwrap_or_else(|e| panic!("{}", e.emit_to_string(src)));
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|e| panic!("validation: {e:?}"));
    module
}

fn entry_point<'a>(module: &'a naga::Module, name: &str) -> &'a naga::EntryPoint {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name)
        .unwrap_or_else(|| panic!("missing entry point {name}"))
}

#[test]
fn projection_shader_validates() {
    let module = validate(PROJECT_WGSL);
    let ep = entry_point(&module, "project");
    assert_eq!(ep.stage, naga::ShaderStage::Compute);
    assert_eq!(ep.workgroup_size, [sphere_engine::kernels::WORKGROUP_SIZE, 1, 1]);
}

#[test]
fn displacement_shader_validates() {
    let module = validate(DISPLACE_WGSL);
    let ep = entry_point(&module, "main");
    assert_eq!(ep.stage, naga::ShaderStage::Compute);
    assert_eq!(ep.workgroup_size, [sphere_engine::kernels::WORKGROUP_SIZE, 1, 1]);
}

#[test]
fn noise_entry_layout_matches_host() {
    let module = validate(DISPLACE_WGSL);
    let (_, ty) = module
        .types
        .iter()
        .find(|(_, t)| t.name.as_deref() == Some("NoiseEntry"))
        .unwrap_or_else(|| panic!("NoiseEntry not declared"));
    match &ty.inner {
        naga::TypeInner::Struct { members, span } => {
            assert_eq!(*span as usize, std::mem::size_of::<sphere_engine::CompiledNoiseEntry>());
            let offsets: Vec<u32> = members.iter().map(|m| m.offset).collect();
            assert_eq!(offsets, vec![0, 12, 16, 20, 24, 28, 32, 36, 40, 44]);
        }
        other => panic!("NoiseEntry is not a struct: {other:?}"),
    }
}
