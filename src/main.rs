use eframe::egui;
use startpage::app::StartPageApp;
use startpage::logging;
use startpage::settings::{Settings, SETTINGS_FILE};

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SETTINGS_FILE.to_string());
    let settings = Settings::load(&settings_path)?;
    logging::init(settings.debug_logging, settings.log_file.clone());
    tracing::info!(settings = %settings_path, "starting start page");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Start Page",
        native_options,
        Box::new(move |_cc| Box::new(StartPageApp::new(settings))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the window: {e}"))
}
