mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::RustySunApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Map files given on the command line are opened at start-up.
    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Sun – Map Sequence Viewer",
        options,
        Box::new(move |_cc| {
            let mut app = RustySunApp::default();
            if !paths.is_empty() {
                app.state.open_paths(&paths);
            }
            Ok(Box::new(app))
        }),
    )
}
