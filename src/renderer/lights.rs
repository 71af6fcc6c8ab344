use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

pub const POINT_LIGHT_COUNT: usize = 2;
pub const CUBE_FACE_COUNT: usize = 6;

/// World positions of the two lamp heads.
pub const LAMP_LIGHT_POSITIONS: [Vec3; POINT_LIGHT_COUNT] = [
    Vec3::new(-1.74, 1.48, -0.12),
    Vec3::new(1.74, 1.48, 0.12),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    /// Roughly a 50 unit range.
    pub const STREET_LAMP: Self = Self {
        constant: 1.0,
        linear: 0.09,
        quadratic: 0.032,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
}

impl PointLight {
    pub const NEAR_PLANE: f32 = 1.0;
    pub const FAR_PLANE: f32 = 25.0;

    pub fn street_lamp(position: Vec3) -> Self {
        Self {
            position,
            near: Self::NEAR_PLANE,
            far: Self::FAR_PLANE,
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.4),
            specular: Vec3::ONE,
            attenuation: Attenuation::STREET_LAMP,
        }
    }

    pub fn lamp_pair() -> [PointLight; POINT_LIGHT_COUNT] {
        LAMP_LIGHT_POSITIONS.map(Self::street_lamp)
    }

    /// 90 degree square frustum shared by all six faces.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_lh(FRAC_PI_2, 1.0, self.near, self.far)
    }

    pub fn face_transforms(&self) -> CubeFaceTransforms {
        let projection = self.projection();
        CubeFaceTransforms {
            view_proj: CubeFace::ALL.map(|face| projection * face.view(self.position)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, 1.0),
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::new(0.3, 0.3, 0.12),
            specular: Vec3::splat(0.1),
        }
    }
}

/// Flashlight attached to the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub cut_off_degrees: f32,
    pub outer_cut_off_degrees: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
    pub enabled: bool,
}

impl SpotLight {
    pub fn flashlight(position: Vec3, direction: Vec3, enabled: bool) -> Self {
        Self {
            position,
            direction,
            cut_off_degrees: 12.5,
            outer_cut_off_degrees: 17.5,
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::ONE,
            attenuation: Attenuation::STREET_LAMP,
            enabled,
        }
    }
}

/// Cube map faces in layer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; CUBE_FACE_COUNT] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn layer(self) -> u32 {
        self as u32
    }

    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vectors for a left-handed look-at rendered with a top-left framebuffer origin. With
    /// these, texel (0, 0) of every layer is the corner that cube sampling reads as (s, t) = (0, 0).
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveY => Vec3::NEG_Z,
            CubeFace::NegativeY => Vec3::Z,
            _ => Vec3::Y,
        }
    }

    pub fn view(self, eye: Vec3) -> Mat4 {
        Mat4::look_to_lh(eye, self.direction(), self.up())
    }

    /// The face that cube sampling selects for `direction` (largest magnitude axis).
    pub fn from_direction(direction: Vec3) -> CubeFace {
        let magnitude = direction.abs();
        if magnitude.x >= magnitude.y && magnitude.x >= magnitude.z {
            if direction.x >= 0.0 {
                CubeFace::PositiveX
            } else {
                CubeFace::NegativeX
            }
        } else if magnitude.y >= magnitude.z {
            if direction.y >= 0.0 {
                CubeFace::PositiveY
            } else {
                CubeFace::NegativeY
            }
        } else if direction.z >= 0.0 {
            CubeFace::PositiveZ
        } else {
            CubeFace::NegativeZ
        }
    }
}

/// View-projection matrices for the six faces of one light, in `CubeFace::ALL` order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeFaceTransforms {
    pub view_proj: [Mat4; CUBE_FACE_COUNT],
}

impl CubeFaceTransforms {
    pub fn face(&self, face: CubeFace) -> Mat4 {
        self.view_proj[face.layer() as usize]
    }
}

/// Remembers each light's face matrices and rebuilds them only when the light moves.
#[derive(Debug, Default)]
pub struct FaceTransformCache {
    entries: [Option<CachedFaces>; POINT_LIGHT_COUNT],
}

#[derive(Clone, Copy, Debug)]
struct CachedFaces {
    position: Vec3,
    near: f32,
    far: f32,
    transforms: CubeFaceTransforms,
}

impl FaceTransformCache {
    pub fn get(&mut self, index: usize, light: &PointLight) -> CubeFaceTransforms {
        let Some(slot) = self.entries.get_mut(index) else {
            return light.face_transforms();
        };
        let current = slot.as_ref().filter(|cached| {
            cached.position == light.position && cached.near == light.near && cached.far == light.far
        });
        if let Some(cached) = current {
            return cached.transforms;
        }

        let transforms = light.face_transforms();
        log::debug!("Rebuilt cube face transforms for light {index}");
        *slot = Some(CachedFaces {
            position: light.position,
            near: light.near,
            far: light.far,
            transforms,
        });
        transforms
    }
}
