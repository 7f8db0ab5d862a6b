//! Image preview with drag-to-select cropping.
//!
//! The preview follows the [`SharedImage`]: whenever its revision changes the
//! new image is traced onto the [`OffscreenTracer`] at natural size and shown.
//! Pointer input over the shown image drives the selection gesture, which the
//! [`CropPicker`] turns into an overlay. [`Preview::crop`] replaces the shown
//! image with the pixels under the overlay.

use std::path::Path;
use std::rc::Rc;

use eframe::egui;
use eframe::egui::{Pos2, Rect};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::Result;
use crate::geometry::{FinalCoords, InitialCoords, crop_region};
use crate::picker::CropPicker;
use crate::state::{EncodedImage, SharedImage};
use crate::tracer::OffscreenTracer;

const PADDING: f32 = 20.0;
const PLACEHOLDER_SIZE: egui::Vec2 = egui::vec2(320.0, 240.0);

/// Selection gesture state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interaction {
    /// No gesture in progress and nothing selected yet.
    #[default]
    Idle,
    /// Pointer held down, overlay follows it.
    Selecting,
    /// Gesture ended, end point frozen.
    Selected,
}

/// The image currently shown by the preview.
#[derive(Debug)]
pub struct RenderedImage {
    source: Rc<EncodedImage>,
    pixels: RgbaImage,
}

impl RenderedImage {
    /// The encoded image this was rendered from.
    pub fn source(&self) -> &Rc<EncodedImage> {
        &self.source
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn size(&self) -> [u32; 2] {
        [self.pixels.width(), self.pixels.height()]
    }
}

pub struct Preview {
    image: SharedImage,
    generic: bool,
    seen_revision: u64,
    tracer: OffscreenTracer,
    picker: CropPicker,
    rendered: Option<RenderedImage>,
    texture: Option<egui::TextureHandle>,
    texture_dirty: bool,
    /// Screen rect the image was last laid out at.
    image_rect: Option<Rect>,
    interaction: Interaction,
    initial: Option<InitialCoords>,
    final_coords: Option<FinalCoords>,
}

impl Preview {
    pub fn new(image: SharedImage, generic: bool) -> Self {
        Self {
            image,
            generic,
            seen_revision: 0,
            tracer: OffscreenTracer::new(),
            picker: CropPicker::new(),
            rendered: None,
            texture: None,
            texture_dirty: false,
            image_rect: None,
            interaction: Interaction::Idle,
            initial: None,
            final_coords: None,
        }
    }

    pub fn img(&self) -> Option<&RenderedImage> {
        self.rendered.as_ref()
    }

    pub fn image_rect(&self) -> Option<Rect> {
        self.image_rect
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn picker(&self) -> &CropPicker {
        &self.picker
    }

    pub fn tracer(&self) -> &OffscreenTracer {
        &self.tracer
    }

    pub fn is_picked(&self) -> bool {
        self.picker.is_picked(
            self.final_coords.as_ref(),
            self.interaction == Interaction::Selecting,
        )
    }

    /// Pick up changes to the shared image.
    pub fn sync(&mut self) {
        let revision = self.image.revision();
        if revision == self.seen_revision {
            return;
        }
        self.seen_revision = revision;

        let current = self.image.get();
        self.reset_selection();
        self.picker.on_image_changed(current.is_some());
        self.texture_dirty = true;

        let Some(source) = current else {
            log::debug!("Preview emptied");
            self.rendered = None;
            self.image_rect = None;
            return;
        };

        match source.decode() {
            Ok(decoded) => {
                let (width, height) = (decoded.width(), decoded.height());
                self.tracer.draw(&decoded, width, height);
                self.rendered = Some(RenderedImage {
                    source,
                    pixels: self.tracer.pixels().clone(),
                });
                log::debug!("Preview traced {width}x{height}");
            }
            Err(e) => {
                log::warn!("Failed to decode {} image: {}", source.mime(), e);
                self.rendered = None;
                self.image_rect = None;
            }
        }
    }

    fn reset_selection(&mut self) {
        self.interaction = Interaction::Idle;
        self.initial = None;
        self.final_coords = None;
        self.picker.clear();
    }

    /// Record where the image is shown on screen.
    pub fn layout(&mut self, image_rect: Rect) {
        if self.rendered.is_some() {
            self.image_rect = Some(image_rect);
        }
    }

    pub fn mouse_down(&mut self, pos: Pos2) {
        if !self.image.is_loaded() {
            return;
        }
        let Some(image_rect) = self.image_rect else {
            return;
        };

        let interactive = self.interaction == Interaction::Selecting;
        if self.picker.pointer_down(pos, interactive, image_rect) {
            return;
        }
        if !image_rect.contains(pos) {
            return;
        }

        if self.is_picked() {
            self.final_coords = None;
            self.picker.clear();
        }

        self.interaction = Interaction::Selecting;
        self.initial = Some(InitialCoords::new(pos, image_rect.min));
        self.final_coords = None;
        self.picker.update(self.initial.as_ref(), None, true);
    }

    pub fn mouse_move(&mut self, pos: Pos2) {
        if self.picker.is_dragging() {
            self.picker.pointer_move(pos);
            if !self.picker.contains(pos) {
                self.picker.pointer_up();
            }
            return;
        }
        if self.interaction == Interaction::Selecting {
            self.track(pos);
        }
    }

    pub fn mouse_up(&mut self, pos: Pos2) {
        if self.picker.is_dragging() {
            self.picker.pointer_up();
            return;
        }
        if self.interaction == Interaction::Selecting {
            self.track(pos);
            if let Some(image_rect) = self.image_rect {
                self.picker.freeze(image_rect);
            }
            self.interaction = Interaction::Selected;
        }
    }

    pub fn mouse_leave(&mut self, pos: Pos2) {
        self.mouse_up(pos);
    }

    fn track(&mut self, pos: Pos2) {
        let origin = self.image_rect.map_or(Pos2::ZERO, |rect| rect.min);
        self.final_coords = Some(FinalCoords::new(pos, origin));
        self.picker
            .update(self.initial.as_ref(), self.final_coords.as_ref(), true);
    }

    /// Replace the shown image with the selected region.
    ///
    /// Returns `false` without touching anything when there is no picked
    /// selection or no image.
    pub fn crop(&mut self) -> bool {
        if !self.is_picked() {
            log::debug!("Crop ignored: nothing picked");
            return false;
        }
        let (Some(image_rect), Some(overlay)) = (self.image_rect, self.picker.overlay()) else {
            log::debug!("Crop ignored: no image");
            return false;
        };
        if self.rendered.is_none() {
            log::debug!("Crop ignored: no image");
            return false;
        }

        let natural = [self.tracer.width(), self.tracer.height()];
        let Some(region) = crop_region(overlay, image_rect, natural) else {
            return false;
        };

        let cropped = self.tracer.get_image_data(region);
        self.tracer.set_size(region.width, region.height);
        self.tracer.put_image_data(&cropped, 0, 0);

        match self.tracer.to_encoded() {
            Ok(encoded) => {
                self.rendered = Some(RenderedImage {
                    source: Rc::new(encoded),
                    pixels: self.tracer.pixels().clone(),
                });
            }
            Err(e) => {
                log::error!("Failed to encode cropped image: {}", e);
                return false;
            }
        }

        log::info!(
            "Cropped {}x{} at ({}, {})",
            region.width,
            region.height,
            region.x,
            region.y
        );
        self.image_rect = Some(Rect::from_min_size(
            image_rect.min,
            egui::vec2(region.width as f32, region.height as f32),
        ));
        self.texture_dirty = true;
        self.reset_selection();
        true
    }

    /// Write the shown image to `path`, format taken from the extension.
    pub fn save_displayed(&self, path: &Path) -> Result<()> {
        let Some(rendered) = &self.rendered else {
            return Ok(());
        };
        let image = DynamicImage::ImageRgba8(rendered.pixels.clone());
        match ImageFormat::from_path(path) {
            // JPEG has no alpha channel.
            Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgb8(image.to_rgb8()).save(path)?,
            _ => image.save(path)?,
        }
        log::info!("Saved {}", path.display());
        Ok(())
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        self.sync();

        let Some(size) = self.rendered.as_ref().map(RenderedImage::size) else {
            if self.generic {
                Self::show_placeholder(ui);
            }
            return;
        };
        let Some(texture) = self.texture(ui.ctx()) else {
            return;
        };

        let available_size = ui.available_size();
        let max_size = available_size - egui::vec2(PADDING * 2.0, PADDING * 2.0);
        let image_size = egui::vec2(size[0] as f32, size[1] as f32);

        // Fit within the available space, never upscaling.
        let scale = (max_size.x / image_size.x)
            .min(max_size.y / image_size.y)
            .min(1.0);
        let display_size = image_size * scale;
        let total_display_size = display_size + egui::vec2(PADDING * 2.0, PADDING * 2.0);

        let x_offset = (available_size.x - total_display_size.x) / 2.0;
        let y_offset = (available_size.y - total_display_size.y) / 2.0;
        let start_pos = ui.cursor().min + egui::vec2(x_offset.max(0.0), y_offset.max(0.0));
        let target_rect = egui::Rect::from_min_size(start_pos, total_display_size);

        let response = ui.allocate_rect(target_rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(target_rect);

        let image_rect =
            egui::Rect::from_min_size(target_rect.min + egui::vec2(PADDING, PADDING), display_size);
        self.layout(image_rect);

        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        self.handle_pointer(ui, &response, image_rect);

        if let Some(overlay) = self.picker.overlay() {
            Self::paint_overlay(&painter, image_rect, overlay);
        }
    }

    fn texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        if !self.texture_dirty {
            if let Some(texture) = &self.texture {
                return Some(texture.clone());
            }
        }
        let rendered = self.rendered.as_ref()?;
        let size = [rendered.pixels.width() as _, rendered.pixels.height() as _];
        let pixels = rendered.pixels.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        let texture = ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR);
        self.texture = Some(texture.clone());
        self.texture_dirty = false;
        Some(texture)
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, image_rect: Rect) {
        let latest = ui.input(|i| i.pointer.latest_pos());
        let pos = response.interact_pointer_pos().or(latest);

        if response.drag_started() {
            // The gesture starts where the button went down, not where the
            // drag threshold was crossed.
            if let Some(origin) = ui.input(|i| i.pointer.press_origin()).or(pos) {
                self.mouse_down(origin);
            }
        }

        if let Some(pos) = pos {
            if response.dragged() {
                if self.interaction == Interaction::Selecting && !image_rect.contains(pos) {
                    self.mouse_leave(pos);
                } else {
                    self.mouse_move(pos);
                }
            }
            if response.drag_stopped() {
                self.mouse_up(pos);
            }
            if response.clicked() {
                // Press and release without a drag in between.
                self.mouse_down(pos);
                self.mouse_up(pos);
            }
        }

        let Some(hover) = response.hover_pos() else {
            return;
        };
        let cursor = if self.picker.is_dragging() {
            egui::CursorIcon::Grabbing
        } else if self.is_picked() && self.picker.contains(hover) {
            egui::CursorIcon::Grab
        } else if image_rect.contains(hover) {
            egui::CursorIcon::Crosshair
        } else {
            return;
        };
        ui.ctx().set_cursor_icon(cursor);
    }

    /// Dim everything outside the overlay and outline it.
    fn paint_overlay(painter: &egui::Painter, image_rect: Rect, overlay: Rect) {
        let overlay_color = egui::Color32::from_black_alpha(150);
        let inner = overlay.intersect(image_rect);

        if inner.is_positive() {
            // Top
            painter.rect_filled(
                egui::Rect::from_min_max(image_rect.min, egui::pos2(image_rect.max.x, inner.min.y)),
                0.0,
                overlay_color,
            );
            // Bottom
            painter.rect_filled(
                egui::Rect::from_min_max(egui::pos2(image_rect.min.x, inner.max.y), image_rect.max),
                0.0,
                overlay_color,
            );
            // Left
            painter.rect_filled(
                egui::Rect::from_min_max(
                    egui::pos2(image_rect.min.x, inner.min.y),
                    egui::pos2(inner.min.x, inner.max.y),
                ),
                0.0,
                overlay_color,
            );
            // Right
            painter.rect_filled(
                egui::Rect::from_min_max(
                    egui::pos2(inner.max.x, inner.min.y),
                    egui::pos2(image_rect.max.x, inner.max.y),
                ),
                0.0,
                overlay_color,
            );
        }

        painter.rect_stroke(overlay, 0.0, egui::Stroke::new(1.0, egui::Color32::WHITE));
    }

    fn show_placeholder(ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(PLACEHOLDER_SIZE, egui::Sense::hover());
        let painter = ui.painter_at(rect);
        let visuals = ui.visuals();
        painter.rect_filled(rect, 4.0, visuals.extreme_bg_color);
        painter.rect_stroke(rect, 4.0, visuals.widgets.noninteractive.bg_stroke);
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "🖼",
            egui::FontId::proportional(64.0),
            visuals.weak_text_color(),
        );
    }
}
