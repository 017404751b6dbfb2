mod app;
mod color;
mod state;
mod ui;

use app::SalaryLensApp;
use eframe::egui;
use salary_lens::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::from_args(std::env::args());
    log::info!("Starting with dataset {}", config.dataset_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Salary Lens – Data Science Salaries",
        options,
        Box::new(|_cc| Ok(Box::new(SalaryLensApp::new(config)))),
    )
}
