/// A camera intent produced from pointer input.
///
/// Deltas are in physical pixels; the camera decides how far each moves it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAction {
    /// Rotate around the target.
    Orbit { dx: f32, dy: f32 },
    /// Slide the target in the view plane.
    Pan { dx: f32, dy: f32 },
    /// Move towards (positive) or away from (negative) the target.
    Zoom { steps: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Tracks held buttons and turns motion and scroll into [`CameraAction`]s.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    primary: bool,
    secondary: bool,
    middle: bool,
    over_ui: bool,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        match button {
            PointerButton::Primary => self.primary = pressed,
            PointerButton::Secondary => self.secondary = pressed,
            PointerButton::Middle => self.middle = pressed,
        }
    }

    /// Mark the pointer as owned by an overlay such as the debug panel.
    pub fn set_over_ui(&mut self, over_ui: bool) {
        self.over_ui = over_ui;
    }

    pub fn is_dragging(&self) -> bool {
        self.primary || self.secondary || self.middle
    }

    /// Pointer moved by `(dx, dy)` pixels.
    pub fn motion(&self, dx: f32, dy: f32) -> Option<CameraAction> {
        if self.over_ui || (dx == 0.0 && dy == 0.0) {
            return None;
        }
        if self.primary {
            Some(CameraAction::Orbit { dx, dy })
        } else if self.secondary || self.middle {
            Some(CameraAction::Pan { dx, dy })
        } else {
            None
        }
    }

    /// Wheel moved by `lines` notches; positive scrolls up (zoom in).
    pub fn scroll(&self, lines: f32) -> Option<CameraAction> {
        if self.over_ui || lines == 0.0 {
            return None;
        }
        Some(CameraAction::Zoom { steps: lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_drag_orbits() {
        let mut p = PointerState::new();
        assert_eq!(p.motion(3.0, 1.0), None);
        p.button(PointerButton::Primary, true);
        assert_eq!(p.motion(3.0, 1.0), Some(CameraAction::Orbit { dx: 3.0, dy: 1.0 }));
        p.button(PointerButton::Primary, false);
        assert!(!p.is_dragging());
    }

    #[test]
    fn secondary_and_middle_drag_pan() {
        let mut p = PointerState::new();
        p.button(PointerButton::Secondary, true);
        assert!(matches!(p.motion(1.0, 0.0), Some(CameraAction::Pan { .. })));
        p.button(PointerButton::Secondary, false);
        p.button(PointerButton::Middle, true);
        assert!(matches!(p.motion(0.0, 2.0), Some(CameraAction::Pan { .. })));
    }

    #[test]
    fn scroll_zooms() {
        let p = PointerState::new();
        assert_eq!(p.scroll(-1.0), Some(CameraAction::Zoom { steps: -1.0 }));
        assert_eq!(p.scroll(0.0), None);
    }

    #[test]
    fn ui_captures_pointer() {
        let mut p = PointerState::new();
        p.button(PointerButton::Primary, true);
        p.set_over_ui(true);
        assert_eq!(p.motion(5.0, 5.0), None);
        assert_eq!(p.scroll(1.0), None);
    }
}
