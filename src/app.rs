// app.rs
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::context::AppContext;
use crate::error::{RenderError, StartupError};
use crate::input::Toggle;
use crate::renderer::{FrameInputs, FrameOrchestrator, Renderer};
use crate::scene::scene_objects;
use crate::settings::RenderSettings;
use crate::state::ProgramState;

#[cfg(feature = "egui")]
use crate::ui::SettingsPanel;

pub struct App {
    settings: RenderSettings,
    ctx: AppContext,
    orchestrator: FrameOrchestrator,
    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,
    #[cfg(feature = "egui")]
    panel: SettingsPanel,
    startup_error: Option<StartupError>,
}

impl App {
    pub fn new(settings: RenderSettings) -> Self {
        let state = ProgramState::load(settings.state_path()).unwrap_or_else(|err| {
            log::warn!("Ignoring saved program state ({err}). Using defaults.");
            ProgramState::default()
        });

        Self {
            settings,
            ctx: AppContext::new(state),
            orchestrator: FrameOrchestrator::default(),
            renderer: None,
            window: None,
            #[cfg(feature = "egui")]
            panel: SettingsPanel::new(),
            startup_error: None,
        }
    }

    /// The error that stopped startup, if any.
    pub fn take_startup_error(&mut self) -> Option<StartupError> {
        self.startup_error.take()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), StartupError> {
        let resolution = &self.settings.resolution;
        let attributes = Window::default_attributes()
            .with_title("lamplight")
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let renderer = pollster::block_on(Renderer::new(window.clone(), &self.settings))?;
        set_cursor_captured(&window, !self.ctx.state.ui_enabled);
        window.request_redraw();

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    /// Releases the renderer, then saves the program state. Runs at most once.
    fn shutdown(&mut self) {
        let Some(renderer) = self.renderer.take() else {
            return;
        };
        drop(renderer);
        log::info!("Released GPU resources");

        let path = self.settings.state_path();
        match self.ctx.state.save(&path) {
            Ok(()) => log::info!("Saved program state to {:?}", path),
            Err(err) => log::error!("Failed to save program state: {err}"),
        }
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(window)) = (self.renderer.as_mut(), self.window.as_ref()) else {
            return;
        };

        let dt = self.ctx.clock.tick();
        let toggles = self.ctx.apply_input(dt);
        if toggles.contains(&Toggle::Ui) {
            set_cursor_captured(window, !self.ctx.state.ui_enabled);
        }

        let overlay = self.ctx.state.ui_enabled && cfg!(feature = "egui");
        #[cfg(feature = "egui")]
        if overlay {
            let ctx = &mut self.ctx;
            let panel = &mut self.panel;
            renderer.build_ui(|ui| panel.show(ui, &mut ctx.state, &mut ctx.directional));
        }

        let objects = scene_objects(&self.ctx.state);
        let inputs = FrameInputs {
            objects: &objects,
            lighting: self.ctx.lighting_inputs(renderer.aspect_ratio()),
            overlay,
        };

        match self.orchestrator.run_frame(renderer, &inputs) {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                renderer.reconfigure();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("Surface out of memory, exiting");
                self.exit(event_loop);
                return;
            }
            Err(err) => log::warn!("Frame {} skipped: {err}", self.orchestrator.frame_index() - 1),
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            log::error!("Startup failed: {err}");
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(id) {
            return;
        }

        #[cfg(feature = "egui")]
        let consumed = match self.renderer.as_mut() {
            Some(renderer) if self.ctx.state.ui_enabled => renderer.handle_ui_event(&event),
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let consumed = false;

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.exit(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(renderer), Some(window)) = (self.renderer.as_mut(), &self.window) {
                    renderer.resize(window.inner_size());
                }
            }
            WindowEvent::Focused(false) => self.ctx.input.release_all(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.exit(event_loop);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                // Releases always reach the input state so no key stays held.
                if !consumed || state == ElementState::Released {
                    self.ctx.input.key_event(code, state, repeat);
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                self.ctx.input.scroll(delta);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.ctx.state.camera_mouse_enabled {
                self.ctx.input.mouse_motion(dx, dy);
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn set_cursor_captured(window: &Window, captured: bool) {
    if captured {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(err) = grabbed {
            log::warn!("Cursor grab unavailable: {err}");
        }
    } else if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
        log::warn!("Cursor release failed: {err}");
    }
    window.set_cursor_visible(!captured);
}
