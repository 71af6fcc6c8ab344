pub mod depth;
pub mod frame;
pub mod geometry;
pub(crate) mod internal;
pub mod lights;
pub mod mesh;
pub mod model;
pub mod passes;
pub mod pipeline_builder;
pub mod renderer;
pub mod shadows;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use depth::Depth;
pub use frame::{FrameBackend, FrameInputs, FrameOrchestrator, FramePhase, FrameSequence};
pub use lights::{CubeFace, DirectionalLight, PointLight, SpotLight, POINT_LIGHT_COUNT};
pub use model::{Model, ModelLibrary};
pub use passes::{FrameTargets, LightingInputs, RenderPasses, ShadingStage};
pub use renderer::Renderer;
pub use shadows::{ShadowCubemap, ShadowCubemapManager};
pub use vertex::Vertex;
