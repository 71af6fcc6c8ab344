use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::renderer::lights::{
    Attenuation, CubeFace, CubeFaceTransforms, DirectionalLight, PointLight, SpotLight,
    POINT_LIGHT_COUNT,
};

/// Distance subtracted from the fragment-to-light distance before the occlusion test.
pub const SHADOW_BIAS: f32 = 0.05;

/// Specular strength of every material part.
pub const MATERIAL_SPECULAR: f32 = 0.5;

fn vec4(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

/// One cube face of one light, as seen by `depth_cube.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadowFaceUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = light position, w = far plane.
    pub light_position_far: [f32; 4],
}

impl ShadowFaceUniform {
    pub fn for_light(light: &PointLight, transforms: &CubeFaceTransforms) -> [Self; 6] {
        CubeFace::ALL.map(|face| Self {
            view_proj: transforms.face(face).to_cols_array_2d(),
            light_position_far: vec4(light.position, light.far),
        })
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// x = shininess, y = specular strength.
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, shininess: f32) -> Self {
        let normal = Mat4::from_mat3(Mat3::from_mat4(model).inverse().transpose());
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            params: [shininess, MATERIAL_SPECULAR, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Projection times the view rotation only, for the sky cube.
    pub sky_view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, projection: Mat4, position: Vec3) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            sky_view_proj: (projection * without_translation(view)).to_cols_array_2d(),
            position: vec4(position, 1.0),
        }
    }
}

pub fn without_translation(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub attenuation: [f32; 4],
}

fn attenuation(value: &Attenuation) -> [f32; 4] {
    [value.constant, value.linear, value.quadratic, 0.0]
}

impl From<&PointLight> for PointLightUniform {
    fn from(light: &PointLight) -> Self {
        Self {
            position: vec4(light.position, 1.0),
            ambient: vec4(light.ambient, 0.0),
            diffuse: vec4(light.diffuse, 0.0),
            specular: vec4(light.specular, 0.0),
            attenuation: attenuation(&light.attenuation),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DirectionalLightUniform {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl From<&DirectionalLight> for DirectionalLightUniform {
    fn from(light: &DirectionalLight) -> Self {
        Self {
            direction: vec4(light.direction, 0.0),
            ambient: vec4(light.ambient, 0.0),
            diffuse: vec4(light.diffuse, 0.0),
            specular: vec4(light.specular, 0.0),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub attenuation: [f32; 4],
    /// x = cos(cut-off), y = cos(outer cut-off), z = enabled.
    pub cone: [f32; 4],
}

impl From<&SpotLight> for SpotLightUniform {
    fn from(light: &SpotLight) -> Self {
        Self {
            position: vec4(light.position, 1.0),
            direction: vec4(light.direction, 0.0),
            ambient: vec4(light.ambient, 0.0),
            diffuse: vec4(light.diffuse, 0.0),
            specular: vec4(light.specular, 0.0),
            attenuation: attenuation(&light.attenuation),
            cone: [
                light.cut_off_degrees.to_radians().cos(),
                light.outer_cut_off_degrees.to_radians().cos(),
                if light.enabled { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightingUniform {
    pub point_lights: [PointLightUniform; POINT_LIGHT_COUNT],
    pub directional: DirectionalLightUniform,
    pub spot: SpotLightUniform,
    /// x = far plane, y = bias, z = shadows enabled.
    pub shadow: [f32; 4],
}

impl LightingUniform {
    pub fn new(
        point_lights: &[PointLight; POINT_LIGHT_COUNT],
        directional: &DirectionalLight,
        spot: &SpotLight,
        shadows_enabled: bool,
    ) -> Self {
        Self {
            point_lights: point_lights.each_ref().map(PointLightUniform::from),
            directional: directional.into(),
            spot: spot.into(),
            shadow: [
                point_lights[0].far,
                SHADOW_BIAS,
                if shadows_enabled { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}
