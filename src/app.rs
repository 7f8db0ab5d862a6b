use std::time::Duration;

use eframe::egui;

use crate::config::AppConfig;
use crate::file_picker::{FilePicker, SelectedFile};
use crate::preview::Preview;
use crate::state::SharedImage;

const SAVE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub struct ImagePickerApp {
    image: SharedImage,
    file_picker: FilePicker,
    preview: Preview,
}

impl ImagePickerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: &AppConfig) -> Self {
        let image = SharedImage::new();
        Self {
            file_picker: FilePicker::new(image.clone(), config.allowed.clone()),
            preview: Preview::new(image.clone(), config.generic),
            image,
        }
    }

    /// Select `file` as if it had been picked in the dialog.
    pub fn open(&mut self, file: SelectedFile) {
        self.file_picker.select(&[file]);
    }

    fn save_dialog(&self) {
        if self.preview.img().is_none() {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &SAVE_EXTENSIONS)
            .save_file()
        {
            if let Err(e) = self.preview.save_displayed(&path) {
                log::error!("Failed to save image: {}", e);
            }
        }
    }
}

impl eframe::App for ImagePickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        let dropped: Vec<SelectedFile> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .map(SelectedFile::from_path)
                .collect()
        });
        if !dropped.is_empty() {
            self.file_picker.select(&dropped);
        }

        self.file_picker.poll();
        if self.file_picker.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image").clicked() {
                    self.file_picker.open_dialog();
                }
                if ui
                    .add_enabled(
                        self.image.is_loaded() || self.file_picker.is_loading(),
                        egui::Button::new("Clear"),
                    )
                    .clicked()
                {
                    self.file_picker.clear();
                }

                let has_image = self.preview.img().is_some();
                if ui
                    .add_enabled(self.preview.is_picked(), egui::Button::new("Crop"))
                    .clicked()
                {
                    self.preview.crop();
                }
                if ui
                    .add_enabled(has_image, egui::Button::new("Save Image"))
                    .clicked()
                {
                    self.save_dialog();
                }

                if self.file_picker.is_loading() {
                    ui.spinner();
                }
                if let Some(rendered) = self.preview.img() {
                    let [w, h] = rendered.size();
                    ui.label(format!("{w} × {h}"));
                }
            });

            ui.separator();

            self.preview.show(ui);
        });
    }
}
