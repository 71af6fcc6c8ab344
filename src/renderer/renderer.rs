// renderer/renderer.rs
use std::sync::Arc;

use winit::{dpi::PhysicalSize, window::Window};

use crate::error::{RenderError, StartupError};
use crate::renderer::frame::{FrameBackend, FrameInputs};
use crate::renderer::internal::RenderContext;
use crate::renderer::lights::{CubeFaceTransforms, PointLight, POINT_LIGHT_COUNT};
use crate::renderer::model::ModelLibrary;
use crate::renderer::passes::{FrameTargets, RenderPasses};
use crate::scene::ModelKey;
use crate::settings::RenderSettings;

#[cfg(feature = "egui")]
use crate::ui::{EguiContext, EguiRenderTarget};

/// Surface texture and encoder of the frame being recorded.
struct ActiveFrame {
    surface: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// The wgpu frame backend: owns the device, every pass and the loaded models.
///
/// Fields drop top to bottom, so the shadow cube maps and geometry inside `passes` are released
/// before the device in `context`.
pub struct Renderer {
    frame: Option<ActiveFrame>,
    #[cfg(feature = "egui")]
    egui: EguiContext,
    models: ModelLibrary,
    passes: RenderPasses,
    context: RenderContext,
    window: Arc<Window>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, settings: &RenderSettings) -> Result<Self, StartupError> {
        let size = window.inner_size();
        let context = RenderContext::new(window.clone(), size, settings).await?;
        let passes = RenderPasses::new(
            &context.device,
            &context.queue,
            context.config.format,
            settings,
        )?;
        let models = ModelLibrary::load_all(
            &context.device,
            &context.queue,
            passes.material_layout(),
            &settings.resource_dir,
        );
        log::info!(
            "Loaded {} of {} scene models",
            models.len(),
            ModelKey::ALL.len()
        );

        #[cfg(feature = "egui")]
        let egui = EguiContext::new(&context.device, context.config.format, &window);

        Ok(Self {
            frame: None,
            #[cfg(feature = "egui")]
            egui,
            models,
            passes,
            context,
            window,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    /// Restores the surface after `Lost` or `Outdated`.
    pub fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.context.aspect_ratio()
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.context.config.format
    }

    pub fn models(&self) -> &ModelLibrary {
        &self.models
    }

    /// Forwards a window event to the panel. Returns true when the panel consumed it.
    #[cfg(feature = "egui")]
    pub fn handle_ui_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.egui.handle_event(&self.window, event)
    }

    /// Runs the panel for this frame. The output is drawn by the next overlay pass.
    #[cfg(feature = "egui")]
    pub fn build_ui(&mut self, run_ui: impl FnOnce(&egui::Context)) {
        self.egui.run(&self.window, run_ui);
    }
}

impl FrameBackend for Renderer {
    fn begin_frame(&mut self, frame_index: u64, inputs: &FrameInputs<'_>) -> Result<(), RenderError> {
        let surface = self.context.surface.get_current_texture()?;
        let view = surface
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("FrameEncoder"),
            });

        self.passes.begin_frame(
            &self.context.device,
            &self.context.queue,
            frame_index,
            inputs.objects,
        );
        self.frame = Some(ActiveFrame {
            surface,
            view,
            encoder,
        });
        Ok(())
    }

    fn depth_pass(
        &mut self,
        light_index: usize,
        light: &PointLight,
        transforms: &CubeFaceTransforms,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveFrame)?;
        self.passes.encode_depth_pass(
            &self.context.queue,
            &mut frame.encoder,
            light_index,
            light,
            transforms,
            inputs.objects,
            &self.models,
        )
    }

    fn lighting_pass(
        &mut self,
        lights: &[PointLight; POINT_LIGHT_COUNT],
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveFrame)?;
        let targets = FrameTargets {
            color: &frame.view,
            depth: &self.context.depth.view,
        };
        self.passes.encode_lighting_pass(
            &self.context.queue,
            &mut frame.encoder,
            &targets,
            lights,
            &inputs.lighting,
            inputs.objects,
            &self.models,
        )
    }

    fn skybox_pass(&mut self) -> Result<(), RenderError> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveFrame)?;
        let targets = FrameTargets {
            color: &frame.view,
            depth: &self.context.depth.view,
        };
        self.passes.encode_skybox_pass(&mut frame.encoder, &targets);
        Ok(())
    }

    #[cfg(feature = "egui")]
    fn overlay_pass(&mut self) -> Result<(), RenderError> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveFrame)?;
        if !self.egui.has_pending() {
            return Ok(());
        }
        let mut target = EguiRenderTarget {
            device: &self.context.device,
            queue: &self.context.queue,
            encoder: &mut frame.encoder,
            view: &frame.view,
            surface_size: [self.context.config.width, self.context.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        self.egui.render(&mut target);
        Ok(())
    }

    #[cfg(not(feature = "egui"))]
    fn overlay_pass(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let frame = self.frame.take().ok_or(RenderError::NoActiveFrame)?;
        self.context.queue.submit(Some(frame.encoder.finish()));
        self.window.pre_present_notify();
        frame.surface.present();
        Ok(())
    }

    fn abort_frame(&mut self) {
        if self.frame.take().is_some() {
            log::debug!("Dropped a partially recorded frame");
        }
    }
}
