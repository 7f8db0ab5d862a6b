#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use clap::Parser;
use eframe::egui;
use image_picker::app::ImagePickerApp;
use image_picker::config::Cli;
use image_picker::file_picker::SelectedFile;

fn main() -> eframe::Result {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.config();
    log::debug!("Starting with {:?}", config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Image Picker",
        options,
        Box::new(move |cc| {
            let mut app = ImagePickerApp::new(cc, &config);
            if let Some(path) = cli.path.clone() {
                app.open(SelectedFile::from_path(path));
            }
            Ok(Box::new(app))
        }),
    )
}
