// egui_integration.rs: the settings overlay, drawn after the skybox and before present

use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

const MAX_TEXTURE_SIDE: usize = 2048;

/// egui state plus the output of the last UI run, waiting for the overlay pass.
pub struct EguiContext {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    pending: Option<egui::FullOutput>,
}

pub struct EguiRenderTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    pub surface_size: [u32; 2],
    pub pixels_per_point: f32,
}

impl EguiContext {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            ctx.viewport_id(),
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(MAX_TEXTURE_SIDE),
        );
        // The overlay writes straight into the single-sampled surface view.
        let renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            ctx,
            state,
            renderer,
            pending: None,
        }
    }

    /// Returns true when egui wants the event for itself.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Runs one UI pass and keeps its output for the next `render`.
    ///
    /// An output that never reached the screen is replaced, but its texture uploads are kept so
    /// the font atlas is not lost when frames are skipped.
    pub fn run(&mut self, window: &Window, build: impl FnOnce(&egui::Context)) {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
        build(&self.ctx);
        let mut output = self.ctx.end_pass();
        self.state
            .handle_platform_output(window, std::mem::take(&mut output.platform_output));

        if let Some(previous) = self.pending.take() {
            let mut textures = previous.textures_delta;
            textures.append(std::mem::take(&mut output.textures_delta));
            output.textures_delta = textures;
        }
        self.pending = Some(output);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Draws the pending output over `target.view`. Does nothing when no UI ran this frame.
    pub fn render(&mut self, target: &mut EguiRenderTarget<'_>) {
        let Some(output) = self.pending.take() else {
            return;
        };
        if target.surface_size.contains(&0) {
            return;
        }

        let screen = ScreenDescriptor {
            size_in_pixels: target.surface_size,
            pixels_per_point: target.pixels_per_point,
        };
        for (id, delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, delta);
        }
        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        self.renderer.update_buffers(
            target.device,
            target.queue,
            target.encoder,
            &primitives,
            &screen,
        );

        {
            let mut pass = target
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("OverlayPass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &primitives, &screen);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
