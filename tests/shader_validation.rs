use std::mem;

use lamplight::renderer::passes::lighting::SHADOW_SAMPLE_TYPE;
use lamplight::renderer::uniforms::{CameraUniform, LightingUniform, ObjectUniform, ShadowFaceUniform};

const DEPTH_CUBE: &str = include_str!("../src/shader/depth_cube.wgsl");
const LIT: &str = include_str!("../src/shader/lit.wgsl");
const SKYBOX: &str = include_str!("../src/shader/skybox.wgsl");

fn parse_and_validate(name: &str, source: &str) -> naga::Module {
    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|err| panic!("{name} failed to parse:\n{}", err.emit_to_string(source)));
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .unwrap_or_else(|err| panic!("{name} failed validation: {err:?}"));
    module
}

fn struct_span(module: &naga::Module, name: &str) -> u32 {
    module
        .types
        .iter()
        .find_map(|(_, ty)| match (&ty.name, &ty.inner) {
            (Some(ty_name), naga::TypeInner::Struct { span, .. }) if ty_name == name => Some(*span),
            _ => None,
        })
        .unwrap_or_else(|| panic!("struct {name} not found"))
}

fn assert_entry_points(module: &naga::Module) {
    let names: Vec<&str> = module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
    assert!(names.contains(&"vs_main"), "{names:?}");
    assert!(names.contains(&"fs_main"), "{names:?}");
}

#[test]
fn depth_cube_shader_is_valid() {
    let module = parse_and_validate("depth_cube.wgsl", DEPTH_CUBE);
    assert_entry_points(&module);
    assert_eq!(struct_span(&module, "ShadowFace") as usize, mem::size_of::<ShadowFaceUniform>());
    assert_eq!(struct_span(&module, "ModelData") as usize, mem::size_of::<ObjectUniform>());
}

#[test]
fn lit_shader_is_valid() {
    let module = parse_and_validate("lit.wgsl", LIT);
    assert_entry_points(&module);
    assert_eq!(struct_span(&module, "Camera") as usize, mem::size_of::<CameraUniform>());
    assert_eq!(struct_span(&module, "Lighting") as usize, mem::size_of::<LightingUniform>());
    assert_eq!(struct_span(&module, "ModelData") as usize, mem::size_of::<ObjectUniform>());
}

#[test]
fn skybox_shader_is_valid() {
    let module = parse_and_validate("skybox.wgsl", SKYBOX);
    assert_entry_points(&module);
    assert_eq!(struct_span(&module, "Camera") as usize, mem::size_of::<CameraUniform>());
}

#[test]
fn shadow_cubes_are_read_as_unfilterable_float_textures() {
    assert_eq!(
        SHADOW_SAMPLE_TYPE,
        wgpu::TextureSampleType::Float { filterable: false }
    );

    let module = parse_and_validate("lit.wgsl", LIT);
    for name in ["shadow_cube_0", "shadow_cube_1"] {
        let (_, global) = module
            .global_variables
            .iter()
            .find(|(_, global)| global.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("{name} not declared"));
        match module.types[global.ty].inner {
            naga::TypeInner::Image {
                dim: naga::ImageDimension::Cube,
                arrayed: false,
                class: naga::ImageClass::Sampled {
                    kind: naga::ScalarKind::Float,
                    multi: false,
                },
            } => {}
            ref other => panic!("{name} has type {other:?}"),
        }
    }
}
