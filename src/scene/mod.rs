// scene/mod.rs

pub mod camera;
pub mod layout;
pub mod transform;

pub use camera::{CameraMovement, FlyCamera};
pub use layout::{scene_objects, ModelKey, SceneMesh, SceneObject};
pub use transform::Transform;
