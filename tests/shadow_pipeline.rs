use glam::{Vec2, Vec3};
use lamplight::renderer::lights::{CubeFace, PointLight, LAMP_LIGHT_POSITIONS};
use lamplight::renderer::uniforms::SHADOW_BIAS;

const EPSILON: f32 = 1e-5;

/// CPU copy of `depth_cube.wgsl`'s fragment stage.
fn run_depth_fragment(world_position: Vec3, light: &PointLight) -> f32 {
    (world_position - light.position).length() / light.far
}

/// CPU copy of `lit.wgsl`'s `shadow_factor`.
fn shadow_factor(world_position: Vec3, light: &PointLight, stored: f32, enabled: bool) -> f32 {
    if !enabled {
        return 0.0;
    }
    let closest = stored * light.far;
    let current = (world_position - light.position).length();
    if current - SHADOW_BIAS > closest {
        1.0
    } else {
        0.0
    }
}

/// Texture coordinate a rendered face gives to `world_position`, top-left origin.
fn rendered_uv(face: CubeFace, light: &PointLight, world_position: Vec3) -> Vec2 {
    let clip = light.face_transforms().face(face) * world_position.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5)
}

/// Face-local (s, t) that cube sampling reads for `direction` in wgpu's convention.
fn sampled_uv(direction: Vec3) -> (CubeFace, Vec2) {
    let face = CubeFace::from_direction(direction);
    let (sc, tc, ma) = match face {
        CubeFace::PositiveX => (-direction.z, -direction.y, direction.x),
        CubeFace::NegativeX => (direction.z, -direction.y, direction.x),
        CubeFace::PositiveY => (direction.x, direction.z, direction.y),
        CubeFace::NegativeY => (direction.x, -direction.z, direction.y),
        CubeFace::PositiveZ => (direction.x, -direction.y, direction.z),
        CubeFace::NegativeZ => (-direction.x, -direction.y, direction.z),
    };
    let ma = ma.abs();
    (face, Vec2::new(0.5 * (sc / ma + 1.0), 0.5 * (tc / ma + 1.0)))
}

#[test]
fn plane_below_light_stores_linear_distance() {
    let light = PointLight::street_lamp(Vec3::new(-1.74, 1.48, -0.12));
    let below = Vec3::new(light.position.x, 0.0, light.position.z);

    let stored = run_depth_fragment(below, &light);
    assert!((stored - 0.0592).abs() < EPSILON, "{stored}");
    assert!((stored * light.far - 1.48).abs() < EPSILON);

    let uv = rendered_uv(CubeFace::NegativeY, &light, below);
    assert!(uv.abs_diff_eq(Vec2::splat(0.5), EPSILON), "{uv:?}");
}

#[test]
fn rendered_texels_land_where_cube_sampling_reads_them() {
    let light = PointLight::street_lamp(LAMP_LIGHT_POSITIONS[1]);
    let directions = [
        Vec3::new(1.0, 0.3, -0.2),
        Vec3::new(-1.0, -0.4, 0.6),
        Vec3::new(0.2, 1.0, 0.7),
        Vec3::new(-0.5, -1.0, 0.1),
        Vec3::new(0.3, 0.6, 1.0),
        Vec3::new(0.8, -0.2, -1.0),
    ];

    for direction in directions {
        let (face, expected) = sampled_uv(direction);
        let world_position = light.position + direction * 2.0;
        let actual = rendered_uv(face, &light, world_position);
        assert!(
            actual.abs_diff_eq(expected, 1e-4),
            "{face:?} {direction:?}: rendered {actual:?}, sampled {expected:?}"
        );
    }
}

#[test]
fn occluder_between_light_and_fragment_casts_shadow() {
    let light = PointLight::street_lamp(LAMP_LIGHT_POSITIONS[0]);
    let fragment = Vec3::new(light.position.x, 0.0, light.position.z);
    let occluder = Vec3::new(light.position.x, 0.5, light.position.z);

    let stored = run_depth_fragment(occluder, &light);
    assert_eq!(shadow_factor(fragment, &light, stored, true), 1.0);
}

#[test]
fn unoccluded_surface_is_not_self_shadowed() {
    let light = PointLight::street_lamp(LAMP_LIGHT_POSITIONS[0]);
    for fragment in [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(-2.5, 0.0, 1.2),
        Vec3::new(2.9, 0.0, -1.4),
    ] {
        let stored = run_depth_fragment(fragment, &light);
        assert_eq!(shadow_factor(fragment, &light, stored, true), 0.0, "{fragment:?}");
    }
}

#[test]
fn shadows_off_matches_the_unoccluded_result_everywhere() {
    let light = PointLight::street_lamp(LAMP_LIGHT_POSITIONS[1]);
    for x in -6..=6 {
        for z in -3..=3 {
            let fragment = Vec3::new(x as f32 * 0.5, 0.0, z as f32 * 0.5);
            let unoccluded = shadow_factor(
                fragment,
                &light,
                run_depth_fragment(fragment, &light),
                true,
            );
            for stored in [0.0, 0.01, 0.05, 0.5, 1.0] {
                assert_eq!(shadow_factor(fragment, &light, stored, false), unoccluded);
            }
        }
    }
}
