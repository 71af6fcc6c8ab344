use glam::{Mat4, Quat, Vec3};

/// Translation, rotation and scale applied in `T · R · S` order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn rotated_y(mut self, degrees: f32) -> Self {
        self.rotation = Quat::from_rotation_y(degrees.to_radians()) * self.rotation;
        self
    }

    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale *= factor;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let m = Transform::default().matrix();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn scale_then_rotate_then_translate() {
        let m = Transform::at(Vec3::new(1.0, 2.0, 3.0))
            .rotated_y(90.0)
            .scaled(2.0)
            .matrix();
        // (1,0,0) -> (2,0,0) -> (0,0,-2) -> (1,2,1)
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5));
    }
}
