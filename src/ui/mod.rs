#[cfg(feature = "egui")]
mod egui_integration;

#[cfg(feature = "egui")]
mod settings_panel;

#[cfg(feature = "egui")]
pub use egui_integration::{EguiContext, EguiRenderTarget};

#[cfg(feature = "egui")]
pub use settings_panel::SettingsPanel;

#[cfg(feature = "egui")]
pub use egui;
