pub mod app;
pub mod context;
pub mod error;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod state;
pub mod time;
pub mod ui;

use app::App;
use error::StartupError;
use settings::RenderSettings;
use winit::event_loop::EventLoop;

fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub fn run() -> Result<(), StartupError> {
    init_logging();

    log::info!("Starting lamplight");

    let settings = RenderSettings::load();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings);

    let result = event_loop.run_app(&mut app);

    if let Some(err) = app.take_startup_error() {
        return Err(err);
    }
    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }
    result?;

    log::info!("Application shutdown complete");
    Ok(())
}
