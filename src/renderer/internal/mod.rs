pub mod buffers;
pub mod context;

pub(crate) use buffers::{DynamicUniformBuffer, UniformBuffer};
pub(crate) use context::RenderContext;
