use glam::{Mat4, Vec2, Vec3};
use serde::Deserialize;

/// Pointer input in surface pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Up,
    Move { x: f32, y: f32 },
    /// Pointer left the interactive surface.
    Leave,
    /// Scroll deltas in pixels; `dy` positive scrolls toward the user.
    Wheel { dx: f32, dy: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Dragging, holding the last seen pointer position.
    Dragging { last: Vec2 },
}

/// Tuning constants for the view controller.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Rotation in degrees per pixel of pointer travel.
    pub drag_degrees_per_pixel: f32,
    /// Scroll pixels per world unit of translation.
    pub wheel_divisor: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            drag_degrees_per_pixel: 0.1,
            wheel_divisor: 100.0,
        }
    }
}

/// Accumulates pointer input into a single view matrix.
///
/// The matrix describes motion applied to the world; renderers invert it
/// to place the eye.
#[derive(Debug, Clone)]
pub struct ViewController {
    view: Mat4,
    state: DragState,
    settings: ViewSettings,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new(ViewSettings::default())
    }
}

impl ViewController {
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            view: Mat4::IDENTITY,
            state: DragState::Idle,
            settings,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn settings(&self) -> ViewSettings {
        self.settings
    }

    /// Discard accumulated motion.
    pub fn reset(&mut self) {
        self.view = Mat4::IDENTITY;
        self.state = DragState::Idle;
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } => {
                self.state = DragState::Dragging {
                    last: Vec2::new(x, y),
                };
                tracing::debug!(x, y, "drag started");
            }
            PointerEvent::Up | PointerEvent::Leave => {
                if self.is_dragging() {
                    tracing::debug!(?event, "drag ended");
                }
                self.state = DragState::Idle;
            }
            PointerEvent::Move { x, y } => {
                if let DragState::Dragging { last } = self.state {
                    let position = Vec2::new(x, y);
                    self.rotate(position - last);
                    self.state = DragState::Dragging { last: position };
                }
            }
            PointerEvent::Wheel { dx, dy } => self.zoom(dx, dy),
        }
    }

    /// Pre-multiply a world-space rotation: pitch from `delta.y`, yaw from
    /// `delta.x`.
    fn rotate(&mut self, delta: Vec2) {
        let scale = self.settings.drag_degrees_per_pixel.to_radians();
        let incremental =
            Mat4::from_rotation_x(delta.y * scale) * Mat4::from_rotation_y(delta.x * scale);
        self.view = incremental * self.view;
    }

    fn zoom(&mut self, dx: f32, dy: f32) {
        let divisor = self.settings.wheel_divisor;
        let offset = Vec3::new(dx / divisor, 0.0, dy / divisor);
        self.view *= Mat4::from_translation(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(controller: &mut ViewController, path: &[(f32, f32)]) {
        let (x0, y0) = path[0];
        controller.handle(PointerEvent::Down { x: x0, y: y0 });
        for &(x, y) in &path[1..] {
            controller.handle(PointerEvent::Move { x, y });
        }
        controller.handle(PointerEvent::Up);
    }

    #[test]
    fn starts_idle_at_identity() {
        let c = ViewController::default();
        assert_eq!(c.state(), DragState::Idle);
        assert_eq!(c.view_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn drag_deltas_premultiply_in_event_order() {
        let mut c = ViewController::default();
        drag(&mut c, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);

        let one = 1.0_f32.to_radians();
        let expected = Mat4::from_rotation_x(one) * Mat4::from_rotation_y(one) * Mat4::IDENTITY;
        let reversed = Mat4::from_rotation_y(one) * Mat4::from_rotation_x(one);
        assert!(c.view_matrix().abs_diff_eq(expected, 1e-6));
        assert!(!c.view_matrix().abs_diff_eq(reversed, 1e-7));
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let mut c = ViewController::default();
        c.handle(PointerEvent::Move { x: 50.0, y: 50.0 });
        assert_eq!(c.view_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn leaving_surface_ends_drag() {
        let mut c = ViewController::default();
        c.handle(PointerEvent::Down { x: 0.0, y: 0.0 });
        assert!(c.is_dragging());
        c.handle(PointerEvent::Leave);
        assert!(!c.is_dragging());
        c.handle(PointerEvent::Move { x: 30.0, y: 0.0 });
        assert_eq!(c.view_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn pointer_position_updates_between_moves() {
        let mut c = ViewController::default();
        c.handle(PointerEvent::Down { x: 0.0, y: 0.0 });
        c.handle(PointerEvent::Move { x: 10.0, y: 0.0 });
        c.handle(PointerEvent::Move { x: 20.0, y: 0.0 });
        let expected = Mat4::from_rotation_y(2.0_f32.to_radians());
        assert!(c.view_matrix().abs_diff_eq(expected, 1e-6));
        assert_eq!(
            c.state(),
            DragState::Dragging {
                last: Vec2::new(20.0, 0.0)
            }
        );
    }

    #[test]
    fn wheel_translates_view_in_local_frame() {
        let mut c = ViewController::default();
        c.handle(PointerEvent::Wheel { dx: 50.0, dy: -200.0 });
        let expected = Mat4::from_translation(Vec3::new(0.5, 0.0, -2.0));
        assert!(c.view_matrix().abs_diff_eq(expected, 1e-6));

        // After a yaw, the same scroll moves along the rotated axes.
        let mut rotated = ViewController::default();
        drag(&mut rotated, &[(0.0, 0.0), (900.0, 0.0)]);
        rotated.handle(PointerEvent::Wheel { dx: 0.0, dy: 100.0 });
        let moved = rotated.view_matrix().w_axis.truncate();
        assert!(moved.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn wheel_works_while_dragging() {
        let mut c = ViewController::default();
        c.handle(PointerEvent::Down { x: 0.0, y: 0.0 });
        c.handle(PointerEvent::Wheel { dx: 0.0, dy: 100.0 });
        assert!(c.is_dragging());
        assert!(c.view_matrix().w_axis.z > 0.99);
    }

    #[test]
    fn rotation_is_not_clamped() {
        let mut c = ViewController::default();
        drag(&mut c, &[(0.0, 0.0), (0.0, 3600.0)]);
        // 360 degrees of pitch returns to the start.
        assert!(c.view_matrix().abs_diff_eq(Mat4::IDENTITY, 1e-4));
        drag(&mut c, &[(0.0, 0.0), (0.0, 1800.0)]);
        assert!(c.view_matrix().abs_diff_eq(Mat4::from_rotation_x(std::f32::consts::PI), 1e-4));
    }

    #[test]
    fn settings_scale_motion() {
        let mut c = ViewController::new(ViewSettings {
            drag_degrees_per_pixel: 1.0,
            wheel_divisor: 10.0,
        });
        drag(&mut c, &[(0.0, 0.0), (5.0, 0.0)]);
        assert!(c.view_matrix().abs_diff_eq(Mat4::from_rotation_y(5.0_f32.to_radians()), 1e-6));
        c.reset();
        c.handle(PointerEvent::Wheel { dx: 10.0, dy: 0.0 });
        assert!(c.view_matrix().w_axis.x > 0.99);
    }
}
