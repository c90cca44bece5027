mod app;
mod color;
mod state;
mod ui;

use app::SoccerStatApp;
use eframe::egui;
use soccerstat::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::from_env();
    log::info!("starting with {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SoccerStat Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SoccerStatApp::new(config)))),
    )
}
