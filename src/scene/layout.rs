use glam::{Mat4, Vec3};

use crate::scene::transform::Transform;
use crate::state::ProgramState;

pub const CAR_HEIGHT: f32 = 0.11;
pub const CAR_SCALE: f32 = 0.2;
/// Specular exponent of every loaded model.
pub const MODEL_SHININESS: f32 = 128.0;
pub const GROUND_SHININESS: f32 = 32.0;
pub const GROUND_SCALE: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelKey {
    Car,
    Lamps,
    Dumpster,
}

impl ModelKey {
    pub const ALL: [ModelKey; 3] = [ModelKey::Car, ModelKey::Lamps, ModelKey::Dumpster];

    /// Location of the model relative to the resource directory.
    pub fn relative_path(self) -> &'static str {
        match self {
            ModelKey::Car => "objects/jdm/AE86Trueno.obj",
            ModelKey::Lamps => "objects/lamps/lamps.obj",
            ModelKey::Dumpster => "objects/dumpster/dumpster_obj.obj",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneMesh {
    Model(ModelKey),
    Ground,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneObject {
    pub mesh: SceneMesh,
    pub transform: Mat4,
    pub shininess: f32,
}

impl SceneObject {
    fn model(key: ModelKey, transform: Mat4, shininess: f32) -> Self {
        Self {
            mesh: SceneMesh::Model(key),
            transform,
            shininess,
        }
    }
}

pub fn car_transform(x: f32, z: f32, angle_degrees: f32) -> Mat4 {
    Transform::at(Vec3::new(x, CAR_HEIGHT, z))
        .rotated_y(angle_degrees)
        .scaled(CAR_SCALE)
        .matrix()
}

/// The three dumpsters. Each one is placed relative to the previous one.
pub fn dumpster_transforms() -> [Mat4; 3] {
    let first = Transform::at(Vec3::new(2.6, 0.0, 0.9))
        .rotated_y(-90.0)
        .scaled(0.25)
        .matrix();
    let second = first * Transform::at(Vec3::new(-2.1, 0.0, 0.0)).rotated_y(-10.0).matrix();
    let third = second
        * Mat4::from_rotation_y(10f32.to_radians())
        * Transform::at(Vec3::new(-4.5, 0.0, 0.0)).rotated_y(10.0).matrix();
    [first, second, third]
}

/// Every object drawn this frame, in draw order. Only the car depends on `state`.
pub fn scene_objects(state: &ProgramState) -> Vec<SceneObject> {
    let mut objects = Vec::with_capacity(6);
    objects.push(SceneObject::model(
        ModelKey::Car,
        car_transform(state.car_position.x, state.car_position.z, state.car_angle),
        MODEL_SHININESS,
    ));
    objects.push(SceneObject::model(
        ModelKey::Lamps,
        Transform::at(Vec3::new(0.0, CAR_HEIGHT, 0.0))
            .scaled(CAR_SCALE)
            .matrix(),
        MODEL_SHININESS,
    ));
    objects.extend(
        dumpster_transforms()
            .into_iter()
            .map(|transform| SceneObject::model(ModelKey::Dumpster, transform, MODEL_SHININESS)),
    );
    objects.push(SceneObject {
        mesh: SceneMesh::Ground,
        transform: Mat4::from_scale(Vec3::splat(GROUND_SCALE)),
        shininess: GROUND_SHININESS,
    });
    objects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_has_six_objects_with_one_ground() {
        let objects = scene_objects(&ProgramState::default());
        assert_eq!(objects.len(), 6);
        let grounds = objects
            .iter()
            .filter(|object| object.mesh == SceneMesh::Ground)
            .count();
        assert_eq!(grounds, 1);
        let dumpsters = objects
            .iter()
            .filter(|object| object.mesh == SceneMesh::Model(ModelKey::Dumpster))
            .count();
        assert_eq!(dumpsters, 3);
    }

    #[test]
    fn car_origin_follows_state() {
        let mut state = ProgramState::default();
        state.car_position = Vec3::new(0.7, CAR_HEIGHT, -0.4);
        let car = scene_objects(&state)[0];
        let origin = car.transform.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.7, CAR_HEIGHT, -0.4), 1e-6));
        assert_eq!(car.shininess, MODEL_SHININESS);
    }

    #[test]
    fn dumpsters_chain_from_the_first() {
        let [first, second, _] = dumpster_transforms();
        assert!(first
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(2.6, 0.0, 0.9), 1e-5));
        // (-2.1, 0, 0) scaled by 0.25 and turned -90 degrees about Y lands on -Z.
        assert!(second
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(2.6, 0.0, 0.375), 1e-5));
    }

    #[test]
    fn ground_spans_scaled_quad() {
        let objects = scene_objects(&ProgramState::default());
        let ground = objects.last().copied().expect("ground present");
        let corner = ground.transform.transform_point3(Vec3::new(1.0, 0.0, 0.5));
        assert!(corner.abs_diff_eq(Vec3::new(3.0, 0.0, 1.5), 1e-6));
    }

    #[test]
    fn models_are_glossier_than_the_ground() {
        for object in scene_objects(&ProgramState::default()) {
            let expected = match object.mesh {
                SceneMesh::Model(_) => MODEL_SHININESS,
                SceneMesh::Ground => GROUND_SHININESS,
            };
            assert_eq!(object.shininess, expected, "{:?}", object.mesh);
        }
        assert_eq!(MODEL_SHININESS, 128.0);
        assert_eq!(GROUND_SHININESS, 32.0);
    }

    #[test]
    fn models_are_read_from_obj_files() {
        assert_eq!(ModelKey::Car.relative_path(), "objects/jdm/AE86Trueno.obj");
        assert_eq!(ModelKey::Lamps.relative_path(), "objects/lamps/lamps.obj");
        assert_eq!(
            ModelKey::Dumpster.relative_path(),
            "objects/dumpster/dumpster_obj.obj"
        );
    }
}
