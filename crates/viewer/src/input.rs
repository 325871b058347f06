//! Cursor tracking and normalization into the animator's coordinate space.

use animator::PointerSpace;
use winit::dpi::{PhysicalPosition, PhysicalSize};

/// Tracks the latest cursor position and hover state for one window.
#[derive(Debug, Default)]
pub struct PointerTracker {
    position: Option<PhysicalPosition<f64>>,
    inside: bool,
}

impl PointerTracker {
    pub fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.position = Some(position);
    }

    pub fn handle_cursor_entered(&mut self) {
        self.inside = true;
    }

    pub fn handle_cursor_left(&mut self) {
        self.inside = false;
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Maps the tracked pixel position into the requested plane space.
    /// Returns `None` when nothing should be forwarded (no position yet, or
    /// the effect ignores pointer coordinates).
    pub fn plane_position(
        &self,
        space: PointerSpace,
        size: PhysicalSize<u32>,
    ) -> Option<(f32, f32)> {
        let position = self.position?;
        let width = size.width.max(1) as f32;
        let height = size.height.max(1) as f32;
        let x = position.x as f32 / width;
        let y = position.y as f32 / height;

        match space {
            PointerSpace::UnitSquare => Some((x, y)),
            PointerSpace::CenteredUnit => Some((x * 2.0 - 1.0, -(y * 2.0 - 1.0))),
            PointerSpace::Inactive => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_at(x: f64, y: f64) -> PointerTracker {
        let mut tracker = PointerTracker::default();
        tracker.handle_cursor_moved(PhysicalPosition::new(x, y));
        tracker
    }

    #[test]
    fn no_position_yields_nothing() {
        let tracker = PointerTracker::default();
        let size = PhysicalSize::new(800, 600);
        assert_eq!(tracker.plane_position(PointerSpace::UnitSquare, size), None);
    }

    #[test]
    fn unit_square_keeps_y_down() {
        let tracker = tracker_at(200.0, 150.0);
        let size = PhysicalSize::new(800, 600);
        let (x, y) = tracker
            .plane_position(PointerSpace::UnitSquare, size)
            .unwrap();
        assert!((x - 0.25).abs() < 1e-6);
        assert!((y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn centered_unit_flips_y_up() {
        let size = PhysicalSize::new(800, 600);

        let center = tracker_at(400.0, 300.0);
        let (x, y) = center
            .plane_position(PointerSpace::CenteredUnit, size)
            .unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);

        let top_right = tracker_at(800.0, 0.0);
        let (x, y) = top_right
            .plane_position(PointerSpace::CenteredUnit, size)
            .unwrap();
        assert!((x - 1.0).abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn inactive_space_forwards_nothing() {
        let tracker = tracker_at(10.0, 10.0);
        let size = PhysicalSize::new(800, 600);
        assert_eq!(tracker.plane_position(PointerSpace::Inactive, size), None);
    }

    #[test]
    fn hover_state_follows_enter_and_leave() {
        let mut tracker = PointerTracker::default();
        assert!(!tracker.is_inside());
        tracker.handle_cursor_entered();
        assert!(tracker.is_inside());
        tracker.handle_cursor_left();
        assert!(!tracker.is_inside());
    }
}
