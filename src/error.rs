use std::path::PathBuf;

use thiserror::Error;

use crate::renderer::frame::FramePhase;

/// Failures while reading or writing the persisted program state file.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file line {line}: cannot parse {value:?}")]
    Parse { line: usize, value: String },
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cube face {face} is {width}x{height}, expected {expected}x{expected}")]
    InvalidCubeFace {
        face: usize,
        width: u32,
        height: u32,
        expected: u32,
    },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("glTF import failed: {0}")]
    Import(#[from] gltf::Error),
    #[error("OBJ import failed: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("no model loader for {path:?}")]
    UnsupportedFormat { path: PathBuf },
    #[error("mesh {mesh} primitive {primitive} has no positions")]
    MissingPositions { mesh: usize, primitive: usize },
    #[error("mesh {mesh} primitive {primitive} has no indices")]
    MissingIndices { mesh: usize, primitive: usize },
    #[error("texture for image {index} uses unsupported format {format:?}")]
    Texture {
        index: usize,
        format: gltf::image::Format,
    },
}

#[derive(Debug, Error)]
pub enum ShadowError {
    #[error("shadow map resolution {requested} outside 1..={max}")]
    InvalidResolution { requested: u32, max: u32 },
    #[error("shadow cube map allocation failed: {0}")]
    Allocation(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("shadow map for light {light} was not written in frame {frame}")]
    StaleShadowMap { light: usize, frame: u64 },
    #[error("frame phase {to:?} cannot follow {from:?}")]
    OutOfOrder { from: FramePhase, to: FramePhase },
    #[error("no frame in flight")]
    NoActiveFrame,
    #[error(transparent)]
    Shadow(#[from] ShadowError),
}

/// Fatal errors raised before the first frame is drawn.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error(transparent)]
    Shadow(#[from] ShadowError),
}
