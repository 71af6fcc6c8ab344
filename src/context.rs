use crate::input::{FrameInput, InputState, Toggle};
use crate::renderer::{DirectionalLight, LightingInputs};
use crate::state::ProgramState;
use crate::time::FrameClock;

/// Mutable application state shared by the event handlers and the frame loop.
#[derive(Debug, Default)]
pub struct AppContext {
    pub state: ProgramState,
    pub directional: DirectionalLight,
    pub input: InputState,
    pub clock: FrameClock,
}

impl AppContext {
    pub fn new(state: ProgramState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Applies the input gathered since the last redraw. Returns the toggles that fired.
    pub fn apply_input(&mut self, dt: f32) -> Vec<Toggle> {
        let FrameInput {
            movement,
            look,
            scroll,
            toggles,
        } = self.input.take_frame();

        for toggle in &toggles {
            match toggle {
                Toggle::Ui => self.state.toggle_ui(),
                Toggle::Spotlight => self.state.toggle_spotlight(),
            }
        }

        let camera = &mut self.state.camera;
        for direction in movement {
            camera.process_keyboard(direction, dt);
        }
        if self.state.camera_mouse_enabled && look != glam::Vec2::ZERO {
            camera.process_mouse_movement(look.x, look.y);
        }
        if scroll != 0.0 {
            camera.process_mouse_scroll(scroll);
        }

        toggles
    }

    pub fn lighting_inputs(&self, aspect: f32) -> LightingInputs {
        let camera = &self.state.camera;
        LightingInputs {
            view: camera.view_matrix(),
            projection: camera.projection(aspect),
            camera_position: camera.position,
            camera_front: camera.front,
            directional: self.directional,
            spotlight_enabled: self.state.spotlight_enabled,
            shadows_enabled: self.state.shadows_enabled,
        }
    }
}
