//! Crop-region overlay.
//!
//! While a selection gesture is in progress the overlay follows the pointer.
//! Once the gesture ends the overlay is frozen, and can then be dragged
//! around as a whole without leaving the image it was drawn on.

use eframe::egui::{Pos2, Rect};

use crate::geometry::{FinalCoords, InitialCoords, clamp_translation, selection_rect};

#[derive(Clone, Copy, Debug)]
struct MoveDrag {
    /// Image element bounds, captured once when the drag starts.
    bounds: Rect,
    last: Pos2,
}

#[derive(Debug, Default)]
pub struct CropPicker {
    overlay: Option<Rect>,
    drag: Option<MoveDrag>,
}

impl CropPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the overlay from the gesture coordinates.
    ///
    /// Only has an effect while `interactive` is set; afterwards the overlay
    /// keeps whatever position it was frozen (or dragged) to.
    pub fn update(
        &mut self,
        initial: Option<&InitialCoords>,
        final_coords: Option<&FinalCoords>,
        interactive: bool,
    ) {
        if !interactive {
            return;
        }
        if let Some(initial) = initial {
            self.overlay = Some(selection_rect(initial, final_coords));
        }
    }

    /// End of a selection gesture: pull the overlay back inside `bounds`.
    ///
    /// A gesture that ended past the image edge would otherwise leave an
    /// overlay that cannot be moved without snapping.
    pub fn freeze(&mut self, bounds: Rect) {
        if let Some(rect) = self.overlay.as_mut() {
            *rect = Rect::from_min_max(
                rect.min.clamp(bounds.min, bounds.max),
                rect.max.clamp(bounds.min, bounds.max),
            );
        }
    }

    pub fn overlay(&self) -> Option<Rect> {
        self.overlay
    }

    /// Drop the overlay and any drag in progress.
    pub fn clear(&mut self) {
        self.overlay = None;
        self.drag = None;
    }

    /// A selection is picked once the gesture has ended with an end point
    /// and the frozen overlay covers a positive area.
    pub fn is_picked(&self, final_coords: Option<&FinalCoords>, interactive: bool) -> bool {
        final_coords.is_some()
            && !interactive
            && self
                .overlay
                .is_some_and(|rect| rect.width() > 0.0 && rect.height() > 0.0)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        self.overlay.is_some_and(|rect| rect.contains(pos))
    }

    /// Start moving the frozen overlay if `pos` is on it.
    ///
    /// Returns `true` when the press was consumed by the overlay.
    pub fn pointer_down(&mut self, pos: Pos2, interactive: bool, image_bounds: Rect) -> bool {
        if interactive || !self.contains(pos) {
            return false;
        }
        self.drag = Some(MoveDrag {
            bounds: image_bounds,
            last: pos,
        });
        true
    }

    /// Translate the overlay by the pointer delta while a move is active.
    pub fn pointer_move(&mut self, pos: Pos2) {
        let (Some(drag), Some(rect)) = (self.drag.as_mut(), self.overlay.as_mut()) else {
            return;
        };
        let delta = clamp_translation(*rect, pos - drag.last, drag.bounds);
        *rect = rect.translate(delta);
        drag.last = pos;
    }

    /// Pointer released or left the overlay.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Keep the overlay in sync with the shared image: an empty image
    /// leaves nothing to select.
    pub fn on_image_changed(&mut self, loaded: bool) {
        if !loaded {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn picked(from: Pos2, to: Pos2) -> (CropPicker, FinalCoords) {
        let initial = InitialCoords::new(from, Pos2::ZERO);
        let final_coords = FinalCoords::new(to, Pos2::ZERO);
        let mut picker = CropPicker::new();
        picker.update(Some(&initial), Some(&final_coords), true);
        (picker, final_coords)
    }

    #[test]
    fn test_update_tracks_gesture() {
        let (picker, _) = picked(pos2(50.0, 50.0), pos2(10.0, 20.0));
        assert_eq!(
            picker.overlay(),
            Some(Rect::from_min_size(pos2(10.0, 20.0), vec2(40.0, 30.0)))
        );
    }

    #[test]
    fn test_update_ignored_when_not_interactive() {
        let (mut picker, _) = picked(pos2(0.0, 0.0), pos2(10.0, 10.0));
        let initial = InitialCoords::new(pos2(0.0, 0.0), Pos2::ZERO);
        let other = FinalCoords::new(pos2(90.0, 90.0), Pos2::ZERO);
        picker.update(Some(&initial), Some(&other), false);
        assert_eq!(picker.overlay().unwrap().width(), 10.0);
    }

    #[test]
    fn test_is_picked() {
        let (picker, final_coords) = picked(pos2(0.0, 0.0), pos2(10.0, 10.0));
        assert!(!picker.is_picked(Some(&final_coords), true));
        assert!(!picker.is_picked(None, false));
        assert!(picker.is_picked(Some(&final_coords), false));
    }

    #[test]
    fn test_zero_area_is_not_picked() {
        let (picker, final_coords) = picked(pos2(10.0, 10.0), pos2(10.0, 40.0));
        assert!(!picker.is_picked(Some(&final_coords), false));
    }

    #[test]
    fn test_clear_hides_overlay() {
        let (mut picker, final_coords) = picked(pos2(0.0, 0.0), pos2(10.0, 10.0));
        picker.clear();
        assert!(picker.overlay().is_none());
        assert!(!picker.is_picked(Some(&final_coords), false));
    }

    #[test]
    fn test_move_is_clamped_to_bounds() {
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        let (mut picker, _) = picked(pos2(10.0, 10.0), pos2(30.0, 30.0));

        assert!(picker.pointer_down(pos2(20.0, 20.0), false, bounds));
        assert!(picker.is_dragging());

        picker.pointer_move(pos2(25.0, 30.0));
        assert_eq!(picker.overlay().unwrap().min, pos2(15.0, 20.0));

        picker.pointer_move(pos2(-200.0, 500.0));
        let rect = picker.overlay().unwrap();
        assert_eq!(rect.min, pos2(0.0, 80.0));
        assert_eq!(rect.size(), vec2(20.0, 20.0));

        picker.pointer_up();
        assert!(!picker.is_dragging());
        picker.pointer_move(pos2(50.0, 50.0));
        assert_eq!(picker.overlay().unwrap().min, pos2(0.0, 80.0));
    }

    #[test]
    fn test_freeze_pulls_overlay_inside_bounds() {
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        let (mut picker, final_coords) = picked(pos2(60.0, 50.0), pos2(140.0, -20.0));
        picker.freeze(bounds);
        assert_eq!(
            picker.overlay(),
            Some(Rect::from_min_max(pos2(60.0, 0.0), pos2(100.0, 50.0)))
        );
        assert!(picker.is_picked(Some(&final_coords), false));

        // Moving it now stays put at the edge instead of jumping.
        assert!(picker.pointer_down(pos2(80.0, 25.0), false, bounds));
        picker.pointer_move(pos2(81.0, 25.0));
        assert_eq!(picker.overlay().unwrap().min, pos2(60.0, 0.0));
        picker.pointer_move(pos2(70.0, 30.0));
        assert_eq!(picker.overlay().unwrap().min, pos2(49.0, 5.0));
    }

    #[test]
    fn test_press_outside_or_while_selecting_is_ignored() {
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        let (mut picker, _) = picked(pos2(10.0, 10.0), pos2(30.0, 30.0));
        assert!(!picker.pointer_down(pos2(60.0, 60.0), false, bounds));
        assert!(!picker.pointer_down(pos2(20.0, 20.0), true, bounds));
        assert!(!picker.is_dragging());
    }

    #[test]
    fn test_empty_image_resets_drag_tracking() {
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        let (mut picker, _) = picked(pos2(10.0, 10.0), pos2(30.0, 30.0));
        picker.pointer_down(pos2(20.0, 20.0), false, bounds);

        picker.on_image_changed(true);
        assert!(picker.overlay().is_some());

        picker.on_image_changed(false);
        assert!(picker.overlay().is_none());
        assert!(!picker.is_dragging());
    }
}
