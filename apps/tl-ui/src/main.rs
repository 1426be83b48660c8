#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
#![allow(clippy::collapsible_if)]

mod app;
mod panel;
mod views;

use app::TrajectoryLabApp;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Trajectory Lab"),
        ..Default::default()
    };

    eframe::run_native(
        "Trajectory Lab",
        options,
        Box::new(|cc| Ok(Box::new(TrajectoryLabApp::new(cc)))),
    )
}
