use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use glam::Vec3;
use log::info;

use crate::error::StateError;
use crate::scene::layout::CAR_HEIGHT;
use crate::scene::FlyCamera;

pub const DEFAULT_CAR_ANGLE: f32 = 205.0;

/// Number of whitespace separated values in the state file.
const FIELD_COUNT: usize = 9;

/// Everything the viewer remembers between runs, plus the runtime toggles that live beside it.
///
/// Only the UI flag, camera position and front, and the car's x/z are written to disk.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramState {
    pub ui_enabled: bool,
    pub camera: FlyCamera,
    pub camera_mouse_enabled: bool,
    pub shadows_enabled: bool,
    pub spotlight_enabled: bool,
    pub car_position: Vec3,
    pub car_angle: f32,
}

impl Default for ProgramState {
    fn default() -> Self {
        Self {
            ui_enabled: false,
            camera: FlyCamera::default(),
            camera_mouse_enabled: true,
            shadows_enabled: true,
            spotlight_enabled: false,
            car_position: Vec3::new(0.0, CAR_HEIGHT, 0.0),
            car_angle: DEFAULT_CAR_ANGLE,
        }
    }
}

impl ProgramState {
    /// Reads the state file. A missing file is not an error and yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let state = Self::from_text(&text)?;
                info!("Loaded program state from {:?}", path);
                Ok(state)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No program state at {:?}. Starting from defaults.", path);
                Ok(Self::default())
            }
            Err(source) => Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StateError> {
        let path = path.as_ref();
        let io_error = |source| StateError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, self.to_text()).map_err(io_error)?;
        info!("Saved program state to {:?}", path);
        Ok(())
    }

    /// Parses the nine-line format: ui flag, camera position (3), camera front (3), car x, car z.
    pub fn from_text(text: &str) -> Result<Self, StateError> {
        let mut fields = text.split_whitespace();
        let mut next = |line: usize| {
            fields.next().ok_or(StateError::Parse {
                line,
                value: String::new(),
            })
        };

        let ui_enabled = parse_flag(1, next(1)?)?;
        let position = Vec3::new(
            parse_float(2, next(2)?)?,
            parse_float(3, next(3)?)?,
            parse_float(4, next(4)?)?,
        );
        let front = Vec3::new(
            parse_float(5, next(5)?)?,
            parse_float(6, next(6)?)?,
            parse_float(7, next(7)?)?,
        );
        let car_x = parse_float(8, next(8)?)?;
        let car_z = parse_float(9, next(9)?)?;

        let mut state = Self::default();
        state.ui_enabled = ui_enabled;
        state.camera_mouse_enabled = !ui_enabled;
        state.camera.position = position;
        state.camera.set_front(front);
        state.car_position = Vec3::new(car_x, CAR_HEIGHT, car_z);
        Ok(state)
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let position = self.camera.position;
        let front = self.camera.front;
        let values: [String; FIELD_COUNT] = [
            if self.ui_enabled { "1".to_string() } else { "0".to_string() },
            position.x.to_string(),
            position.y.to_string(),
            position.z.to_string(),
            front.x.to_string(),
            front.y.to_string(),
            front.z.to_string(),
            self.car_position.x.to_string(),
            self.car_position.z.to_string(),
        ];
        for value in values {
            let _ = writeln!(text, "{value}");
        }
        text
    }

    pub fn toggle_ui(&mut self) {
        self.ui_enabled = !self.ui_enabled;
        self.camera_mouse_enabled = !self.ui_enabled;
        info!("Settings panel {}", if self.ui_enabled { "shown" } else { "hidden" });
    }

    pub fn toggle_spotlight(&mut self) {
        self.spotlight_enabled = !self.spotlight_enabled;
        info!("Spotlight {}", if self.spotlight_enabled { "on" } else { "off" });
    }
}

fn parse_flag(line: usize, value: &str) -> Result<bool, StateError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(StateError::Parse {
            line,
            value: other.to_string(),
        }),
    }
}

fn parse_float(line: usize, value: &str) -> Result<f32, StateError> {
    value
        .parse::<f32>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| StateError::Parse {
            line,
            value: value.to_string(),
        })
}
