pub mod depth;
pub mod lighting;
pub mod scene;
pub mod skybox;

pub use depth::DepthPassRenderer;
pub use lighting::{LightingInputs, LightingPass};
pub use scene::SceneRenderer;
pub use skybox::SkyboxPass;

use crate::error::{RenderError, ShadowError};
use crate::renderer::geometry::GeometryBuffers;
use crate::renderer::lights::{CubeFaceTransforms, PointLight, POINT_LIGHT_COUNT};
use crate::renderer::model::{material_layout, ModelLibrary};
use crate::renderer::shadows::{ShadowCubemap, ShadowCubemapManager};
use crate::renderer::texture::{CubeTexture, Texture};
use crate::scene::SceneObject;
use crate::settings::RenderSettings;

pub const FRAME_GROUP: u32 = 0;
pub const OBJECT_GROUP: u32 = 1;
pub const SHADOW_GROUP: u32 = 2;
pub const MATERIAL_GROUP: u32 = 3;

const SKY_FALLBACK: [u8; 4] = [20, 24, 40, 255];
const GROUND_FALLBACK: [u8; 4] = [90, 90, 90, 255];

/// Which shader family a draw goes through.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShadingStage {
    /// Positions only, into a shadow cube face.
    Depth,
    /// Full material and lighting, into the frame.
    Lit,
}

/// Colour and depth attachments of the frame being drawn.
pub struct FrameTargets<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

/// Every pass of the frame and the GPU data they share.
///
/// Field order is drop order: shadow maps go first, then the passes, then shared geometry.
pub struct RenderPasses {
    shadows: ShadowCubemapManager,
    depth: DepthPassRenderer,
    lighting: LightingPass,
    skybox: SkyboxPass,
    scene: SceneRenderer,
    geometry: GeometryBuffers,
    material_layout: wgpu::BindGroupLayout,
}

impl RenderPasses {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        settings: &RenderSettings,
    ) -> Result<Self, ShadowError> {
        let shadows = ShadowCubemapManager::create(device, settings.shadow_map_size, POINT_LIGHT_COUNT)?;

        let material_layout = material_layout(device);
        let scene = SceneRenderer::new(device);
        let depth = DepthPassRenderer::new(device, scene.object_layout());
        let lighting = LightingPass::new(
            device,
            color_format,
            scene.object_layout(),
            &material_layout,
            &shadows,
        );

        let sky = CubeTexture::from_faces_or_color(device, queue, &settings.skybox_faces(), SKY_FALLBACK);
        let skybox = SkyboxPass::new(device, color_format, &lighting, sky);

        let ground = Texture::from_path_or_color(device, queue, settings.ground_texture(), GROUND_FALLBACK);
        let geometry = GeometryBuffers::new(device, &material_layout, ground);

        Ok(Self {
            shadows,
            depth,
            lighting,
            skybox,
            scene,
            geometry,
            material_layout,
        })
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn shadow_cubemap(&self, light: usize) -> Option<&ShadowCubemap> {
        self.shadows.cubemap(light)
    }

    /// Starts freshness tracking for `frame` and uploads the object slots.
    pub fn begin_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: u64,
        objects: &[SceneObject],
    ) {
        self.shadows.begin_frame(frame);
        self.scene.prepare(device, queue, objects);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode_depth_pass(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        light_index: usize,
        light: &PointLight,
        transforms: &CubeFaceTransforms,
        objects: &[SceneObject],
        models: &ModelLibrary,
    ) -> Result<(), RenderError> {
        let cubemap = self
            .shadows
            .cubemap(light_index)
            .ok_or_else(|| ShadowError::Allocation(format!("no cube map for light {light_index}")))?;

        self.depth.prepare(queue, light_index, light, transforms);
        self.depth.render_depth(
            encoder,
            light_index,
            cubemap,
            &self.scene,
            objects,
            models,
            &self.geometry,
        );
        self.shadows.mark_written(light_index);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode_lighting_pass(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        targets: &FrameTargets<'_>,
        point_lights: &[PointLight; POINT_LIGHT_COUNT],
        inputs: &LightingInputs,
        objects: &[SceneObject],
        models: &ModelLibrary,
    ) -> Result<(), RenderError> {
        self.lighting.prepare(queue, point_lights, inputs);
        self.lighting.render(
            encoder,
            targets,
            &self.shadows,
            &self.scene,
            objects,
            models,
            &self.geometry,
        )
    }

    pub fn encode_skybox_pass(&self, encoder: &mut wgpu::CommandEncoder, targets: &FrameTargets<'_>) {
        self.skybox.render(encoder, targets, &self.geometry);
    }
}
