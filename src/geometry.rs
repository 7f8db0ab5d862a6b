//! Selection geometry.
//!
//! Three coordinate spaces meet here:
//!
//! - pointer space: egui screen points, where the selection is drawn,
//! - element space: the same points relative to the rendered image's origin,
//! - pixel space: the source image at its natural size.
//!
//! Everything in this module is pure so it can be tested without a UI.

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Where a selection gesture started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialCoords {
    pub start: Pos2,
    /// `start` relative to the image element's origin.
    pub relative_start: Pos2,
}

impl InitialCoords {
    pub fn new(pointer: Pos2, image_origin: Pos2) -> Self {
        Self {
            start: pointer,
            relative_start: (pointer - image_origin).to_pos2(),
        }
    }
}

/// Where a selection gesture currently ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinalCoords {
    pub end: Pos2,
    /// `end` relative to the image element's origin.
    pub relative_end: Pos2,
}

impl FinalCoords {
    pub fn new(pointer: Pos2, image_origin: Pos2) -> Self {
        Self {
            end: pointer,
            relative_end: (pointer - image_origin).to_pos2(),
        }
    }
}

/// Overlay rectangle for a drag from `initial` to `final_coords`.
///
/// The anchor is the start point. When the pointer went left of (or above)
/// the start the anchor flips to `start - |delta|` so width and height are
/// never negative. Without an end point the overlay is empty at the start.
pub fn selection_rect(initial: &InitialCoords, final_coords: Option<&FinalCoords>) -> Rect {
    let Some(final_coords) = final_coords else {
        return Rect::from_min_size(initial.start, Vec2::ZERO);
    };

    let mut left = initial.start.x;
    let mut top = initial.start.y;
    let mut width = final_coords.end.x - initial.start.x;
    let mut height = final_coords.end.y - initial.start.y;

    if width < 0.0 {
        left = initial.start.x - width.abs();
        width = width.abs();
    }
    if height < 0.0 {
        top = initial.start.y - height.abs();
        height = height.abs();
    }

    Rect::from_min_size(pos2(left, top), vec2(width, height))
}

/// Limit `delta` so that `rect` translated by it stays inside `bounds`.
///
/// On an axis where `rect` is larger than `bounds` it cannot fit, so its
/// leading edge is pinned to the bounds' leading edge instead.
pub fn clamp_translation(rect: Rect, delta: Vec2, bounds: Rect) -> Vec2 {
    vec2(
        clamp_axis(rect.min.x, rect.max.x, delta.x, bounds.min.x, bounds.max.x),
        clamp_axis(rect.min.y, rect.max.y, delta.y, bounds.min.y, bounds.max.y),
    )
}

fn clamp_axis(min: f32, max: f32, delta: f32, lo: f32, hi: f32) -> f32 {
    if max - min > hi - lo {
        return lo - min;
    }
    delta.max(lo - min).min(hi - max)
}

/// A crop in source pixel space. Rounding can push it a pixel past the
/// image edge; such pixels read as transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Translate an overlay drawn over `image_rect` into pixel space of an image
/// whose natural size is `natural`.
///
/// `factor = overlay / rendered` gives the share of the displayed image the
/// overlay covers on each axis; multiplied by the natural size it yields the
/// cropped dimensions. The anchor is scaled by `natural / rendered`.
pub fn crop_region(overlay: Rect, image_rect: Rect, natural: [u32; 2]) -> Option<CropRegion> {
    let rendered = image_rect.size();
    if rendered.x <= 0.0 || rendered.y <= 0.0 || natural[0] == 0 || natural[1] == 0 {
        return None;
    }

    let natural_w = natural[0] as f32;
    let natural_h = natural[1] as f32;

    let factor_w = overlay.width() / rendered.x;
    let factor_h = overlay.height() / rendered.y;

    let width = (factor_w * natural_w).round().max(1.0) as u32;
    let height = (factor_h * natural_h).round().max(1.0) as u32;

    let anchor = overlay.min - image_rect.min;
    let x = (anchor.x * natural_w / rendered.x).round() as i32;
    let y = (anchor.y * natural_h / rendered.y).round() as i32;

    Some(CropRegion {
        x,
        y,
        width,
        height,
    })
}
