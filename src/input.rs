use glam::Vec2;
use winit::event::{ElementState, MouseScrollDelta};
use winit::keyboard::KeyCode;

use crate::scene::CameraMovement;

/// Scroll lines per pixel for touchpad-style deltas.
const PIXELS_PER_LINE: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Ui,
    Spotlight,
}

/// Input gathered for one redraw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub movement: Vec<CameraMovement>,
    pub look: Vec2,
    pub scroll: f32,
    pub toggles: Vec<Toggle>,
}

/// Collects winit events between redraws.
///
/// Movement keys are level-triggered. Toggles are queued on the press transition only, so a held
/// or auto-repeating key fires once.
#[derive(Debug, Default)]
pub struct InputState {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    look: Vec2,
    scroll: f32,
    toggles: Vec<Toggle>,
}

impl InputState {
    pub fn key_event(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            KeyCode::F1 if pressed && !repeat => self.toggles.push(Toggle::Ui),
            KeyCode::KeyY if pressed && !repeat => self.toggles.push(Toggle::Spotlight),
            _ => {}
        }
    }

    /// Raw mouse motion. Screen y grows downwards, so it is flipped for pitch.
    pub fn mouse_motion(&mut self, dx: f64, dy: f64) {
        self.look += Vec2::new(dx as f32, -(dy as f32));
    }

    pub fn scroll(&mut self, delta: MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
    }

    /// Releases every held movement key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
    }

    /// Drains the accumulated look, scroll and toggle events. Held keys stay held.
    pub fn take_frame(&mut self) -> FrameInput {
        let movement = [
            (self.forward, CameraMovement::Forward),
            (self.backward, CameraMovement::Backward),
            (self.left, CameraMovement::Left),
            (self.right, CameraMovement::Right),
        ]
        .into_iter()
        .filter_map(|(held, movement)| held.then_some(movement))
        .collect();

        FrameInput {
            movement,
            look: std::mem::take(&mut self.look),
            scroll: std::mem::take(&mut self.scroll),
            toggles: std::mem::take(&mut self.toggles),
        }
    }
}
