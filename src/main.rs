mod app;
mod color;
mod config;
mod dashboard;
mod data;
mod state;
mod stats;
mod ui;
mod wordcloud;

use anyhow::Context;
use app::StudentDashApp;
use clap::Parser;
use config::Args;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let settings = args.settings().context("loading --schema")?;
    let mut state = AppState::new(settings);
    match args.startup_path() {
        Some(path) => state.open(&path),
        None => log::info!("No data file given; use File → Open…"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Student Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(StudentDashApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
