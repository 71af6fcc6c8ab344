use egui::{DragValue, RichText, Ui};

use crate::renderer::DirectionalLight;
use crate::state::ProgramState;

const CAR_X_RANGE: std::ops::RangeInclusive<f32> = -1.5..=1.5;
const CAR_Z_RANGE: std::ops::RangeInclusive<f32> = -1.0..=1.0;
const CAR_ANGLE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=360.0;
const DIRECTION_RANGE: std::ops::RangeInclusive<f32> = -1.0..=1.0;

/// The "Settings" and "Camera info" windows shown while the panel is toggled on.
pub struct SettingsPanel {
    settings_title: String,
    camera_title: String,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self {
            settings_title: "Settings".to_string(),
            camera_title: "Camera info".to_string(),
        }
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        state: &mut ProgramState,
        directional: &mut DirectionalLight,
    ) {
        egui::Window::new(&self.settings_title)
            .default_width(260.0)
            .show(ctx, |ui| {
                draw_settings(ui, state, directional);
            });

        egui::Window::new(&self.camera_title)
            .default_width(260.0)
            .show(ctx, |ui| {
                draw_camera_info(ui, state);
            });
    }
}

fn draw_settings(ui: &mut Ui, state: &mut ProgramState, directional: &mut DirectionalLight) {
    ui.label(RichText::new("Directional light").strong());
    ui.horizontal(|ui| {
        ui.label("Direction");
        ui.add(
            DragValue::new(&mut directional.direction.x)
                .speed(0.01)
                .range(DIRECTION_RANGE)
                .prefix("x: "),
        );
        ui.add(
            DragValue::new(&mut directional.direction.y)
                .speed(0.01)
                .range(DIRECTION_RANGE)
                .prefix("y: "),
        );
        ui.add(
            DragValue::new(&mut directional.direction.z)
                .speed(0.01)
                .range(DIRECTION_RANGE)
                .prefix("z: "),
        );
    });

    ui.checkbox(&mut state.shadows_enabled, "Shadows");
    ui.separator();

    ui.label(RichText::new("Car").strong());
    ui.horizontal(|ui| {
        ui.label("Position");
        ui.add(
            DragValue::new(&mut state.car_position.x)
                .speed(0.01)
                .range(CAR_X_RANGE)
                .prefix("x: "),
        );
        ui.add(
            DragValue::new(&mut state.car_position.z)
                .speed(0.01)
                .range(CAR_Z_RANGE)
                .prefix("z: "),
        );
    });
    ui.horizontal(|ui| {
        ui.label("Angle");
        ui.add(
            DragValue::new(&mut state.car_angle)
                .speed(1.0)
                .range(CAR_ANGLE_RANGE)
                .suffix("°"),
        );
    });
}

fn draw_camera_info(ui: &mut Ui, state: &mut ProgramState) {
    let camera = &state.camera;
    ui.label(format!(
        "Position: {:.2}, {:.2}, {:.2}",
        camera.position.x, camera.position.y, camera.position.z
    ));
    ui.label(format!("Yaw: {:.1}  Pitch: {:.1}", camera.yaw, camera.pitch));
    ui.label(format!(
        "Front: {:.2}, {:.2}, {:.2}",
        camera.front.x, camera.front.y, camera.front.z
    ));
    ui.separator();
    ui.checkbox(&mut state.camera_mouse_enabled, "Camera mouse update");
}
