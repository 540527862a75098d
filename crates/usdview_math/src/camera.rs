use glam::{DMat4, DVec2, DVec3};

use crate::{Bounds3, RotateExt};

/// Stage up axis, as authored in a layer's `upAxis` metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    /// World-space unit vector for this axis
    pub fn vector(self) -> DVec3 {
        match self {
            UpAxis::Y => DVec3::Y,
            UpAxis::Z => DVec3::Z,
        }
    }
}

/// Look-at camera driven by screen-space pointer deltas.
///
/// The controller stores `eye`, `at` and `up` directly and every gesture
/// rewrites them. `eye` must never equal `at` and `up` must never be parallel
/// to the view direction; neither is guarded, degenerate input produces NaN
/// or zero vectors in the resulting matrices.
///
/// The struct is plain data (`Copy`) so the renderer can take a snapshot
/// each frame instead of sharing mutable state with the input handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    pub eye: DVec3,
    pub at: DVec3,
    pub up: DVec3,
    pub pan_sensitivity: f64,
    pub orbit_sensitivity: f64,
    pub zoom_sensitivity: f64,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EYE, Self::DEFAULT_AT, DVec3::Y)
    }
}

impl CameraController {
    pub const DEFAULT_EYE: DVec3 = DVec3::new(5.0, 3.0, 5.0);
    pub const DEFAULT_AT: DVec3 = DVec3::ZERO;

    pub const DEFAULT_PAN_SENSITIVITY: f64 = 0.01;
    pub const DEFAULT_ORBIT_SENSITIVITY: f64 = 0.5;
    pub const DEFAULT_ZOOM_SENSITIVITY: f64 = 0.05;

    /// Distance used by `frame_bounds` when there is nothing to frame
    const EMPTY_FRAME_DISTANCE: f64 = 10.0;
    const MIN_FRAME_DISTANCE: f64 = 0.1;

    /// Create a camera from explicit eye/at/up with default sensitivities
    pub fn new(eye: DVec3, at: DVec3, up: DVec3) -> Self {
        Self {
            eye,
            at,
            up,
            pan_sensitivity: Self::DEFAULT_PAN_SENSITIVITY,
            orbit_sensitivity: Self::DEFAULT_ORBIT_SENSITIVITY,
            zoom_sensitivity: Self::DEFAULT_ZOOM_SENSITIVITY,
        }
    }

    /// Default camera for a stage with the given up axis
    pub fn for_up_axis(axis: UpAxis) -> Self {
        Self::new(Self::DEFAULT_EYE, Self::DEFAULT_AT, axis.vector())
    }

    /// Distance from eye to the look-at point
    pub fn distance(&self) -> f64 {
        (self.at - self.eye).length()
    }

    /// Normalized view direction (eye towards at)
    pub fn forward(&self) -> DVec3 {
        (self.at - self.eye).normalize()
    }

    /// Translate eye and at together in the camera's screen plane.
    ///
    /// Both screen axes are inverted so that dragging moves the scene with
    /// the pointer.
    pub fn pan(&mut self, delta: DVec2) {
        let forward = self.at - self.eye;
        let right = forward.cross(self.up).normalize();
        let camera_up = right.cross(forward).normalize();

        let offset = (right * -delta.x + camera_up * -delta.y) * self.pan_sensitivity;

        self.eye += offset;
        self.at += offset;
    }

    /// Rotate the eye around `at`.
    ///
    /// Horizontal motion turns about the world up vector first, then vertical
    /// motion turns about the camera right axis recomputed after that first
    /// rotation. The two steps do not commute.
    pub fn orbit(&mut self, delta: DVec2) {
        let horizontal = delta.x * self.orbit_sensitivity;
        let vertical = delta.y * self.orbit_sensitivity;

        let offset = (self.eye - self.at).rotate_about(self.up, horizontal);
        self.eye = self.at + offset;

        let right = (self.at - self.eye).cross(self.up).normalize();
        let offset = (self.eye - self.at).rotate_about(right, vertical);
        self.eye = self.at + offset;
    }

    /// Move the eye along the view direction. Positive moves towards `at`.
    ///
    /// There is no clamping: a large enough delta carries the eye past `at`.
    pub fn zoom(&mut self, delta: f64) {
        let direction = self.forward();
        self.eye += direction * delta * self.zoom_sensitivity;
    }

    /// Scroll-wheel zoom, same motion as [`CameraController::zoom`]
    pub fn zoom_scroll(&mut self, delta: f64) {
        self.zoom(delta);
    }

    /// Look at `point` from `distance` away, keeping the current view direction
    pub fn focus(&mut self, point: DVec3, distance: f64) {
        let back = (self.eye - self.at).normalize();
        self.at = point;
        self.eye = self.at + back * distance;
    }

    /// Fit `bounds` in view while keeping the current orientation.
    ///
    /// Empty bounds fall back to the world origin.
    pub fn frame_bounds(&mut self, bounds: &Bounds3) {
        if bounds.is_empty() {
            self.focus(DVec3::ZERO, Self::EMPTY_FRAME_DISTANCE);
            return;
        }

        let distance = (bounds.diagonal() * 2.0).max(Self::MIN_FRAME_DISTANCE);
        self.focus(bounds.center(), distance);
    }

    /// Restore the default eye and look-at point. `up` is left as is.
    pub fn reset(&mut self) {
        self.eye = Self::DEFAULT_EYE;
        self.at = Self::DEFAULT_AT;
    }

    /// World to camera matrix
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye, self.at, self.up)
    }

    /// Camera to world matrix
    pub fn transform(&self) -> DMat4 {
        self.view_matrix().inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn test_default_camera() {
        let camera = CameraController::default();

        assert_eq!(camera.eye, DVec3::new(5.0, 3.0, 5.0));
        assert_eq!(camera.at, DVec3::ZERO);
        assert_eq!(camera.up, DVec3::Y);
        assert_eq!(camera.pan_sensitivity, 0.01);
        assert_eq!(camera.orbit_sensitivity, 0.5);
        assert_eq!(camera.zoom_sensitivity, 0.05);
    }

    #[test]
    fn test_for_up_axis_z() {
        let camera = CameraController::for_up_axis(UpAxis::Z);
        assert_eq!(camera.up, DVec3::Z);
        assert_eq!(camera.eye, CameraController::DEFAULT_EYE);
    }

    #[test]
    fn test_pan_preserves_direction_and_distance() {
        let mut camera = CameraController::default();
        let before = camera.at - camera.eye;

        for delta in [
            DVec2::new(10.0, 0.0),
            DVec2::new(0.0, -25.0),
            DVec2::new(-3.5, 7.25),
            DVec2::new(1000.0, 1000.0),
        ] {
            camera.pan(delta);
            let after = camera.at - camera.eye;
            assert!((after.length() - before.length()).abs() < EPS);
            assert!(approx(after.normalize(), before.normalize()));
        }
    }

    #[test]
    fn test_pan_moves_opposite_to_screen_delta() {
        // Looking down -Z with +Y up, right is +X
        let mut camera = CameraController::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        camera.pan(DVec2::new(100.0, 0.0));

        assert!(approx(camera.at, DVec3::new(-1.0, 0.0, 0.0)));
        assert!(approx(camera.eye, DVec3::new(-1.0, 0.0, 10.0)));

        camera.pan(DVec2::new(0.0, 100.0));
        assert!(approx(camera.at, DVec3::new(-1.0, -1.0, 0.0)));
    }

    #[test]
    fn test_orbit_preserves_distance() {
        let mut camera = CameraController::default();
        let distance = camera.distance();

        for delta in [
            DVec2::new(30.0, 0.0),
            DVec2::new(0.0, 20.0),
            DVec2::new(-45.0, 12.0),
            DVec2::new(7.0, -60.0),
        ] {
            camera.orbit(delta);
            assert!((camera.distance() - distance).abs() < 1e-9);
            assert_eq!(camera.at, DVec3::ZERO);
        }
    }

    #[test]
    fn test_orbit_horizontal_turns_about_world_up() {
        let mut camera = CameraController::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        // 180 units * 0.5 = 90 degrees about +Y: +Z goes to +X
        camera.orbit(DVec2::new(180.0, 0.0));

        assert!(approx(camera.eye, DVec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_orbit_order_is_horizontal_then_vertical() {
        let start = CameraController::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);

        let mut combined = start;
        combined.orbit(DVec2::new(60.0, 40.0));

        let mut stepwise = start;
        stepwise.orbit(DVec2::new(60.0, 0.0));
        stepwise.orbit(DVec2::new(0.0, 40.0));

        assert!(approx(combined.eye, stepwise.eye));

        // 30 degrees of yaw, then 20 degrees about the post-yaw right axis
        let (s20, c20) = 20.0_f64.to_radians().sin_cos();
        let (s30, c30) = 30.0_f64.to_radians().sin_cos();
        let expected = DVec3::new(10.0 * c20 * s30, -10.0 * s20, 10.0 * c20 * c30);
        assert!(approx(combined.eye, expected));
    }

    #[test]
    fn test_zoom_zero_is_noop() {
        let mut camera = CameraController::default();
        let before = camera;
        camera.zoom(0.0);
        camera.zoom_scroll(0.0);

        assert_eq!(camera, before);
    }

    #[test]
    fn test_zoom_sign_moves_towards_or_away() {
        let mut camera = CameraController::default();
        let distance = camera.distance();

        camera.zoom(10.0);
        assert!((camera.distance() - (distance - 0.5)).abs() < EPS);
        assert_eq!(camera.at, DVec3::ZERO);

        camera.zoom(-20.0);
        assert!((camera.distance() - (distance + 0.5)).abs() < EPS);
    }

    #[test]
    fn test_zoom_can_cross_past_target() {
        let mut camera = CameraController::new(DVec3::new(0.0, 0.0, 1.0), DVec3::ZERO, DVec3::Y);
        // 60 * 0.05 = 3 units along -Z
        camera.zoom(60.0);

        assert!(approx(camera.eye, DVec3::new(0.0, 0.0, -2.0)));
        assert_eq!(camera.at, DVec3::ZERO);
    }

    #[test]
    fn test_zoom_scroll_matches_zoom() {
        let mut a = CameraController::default();
        let mut b = CameraController::default();
        a.zoom(3.0);
        b.zoom_scroll(3.0);

        assert_eq!(a, b);
    }

    #[test]
    fn test_focus_keeps_previous_direction() {
        let mut camera = CameraController::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        camera.focus(DVec3::new(1.0, 2.0, 3.0), 4.0);

        assert_eq!(camera.at, DVec3::new(1.0, 2.0, 3.0));
        assert!(approx(camera.eye, DVec3::new(1.0, 2.0, 7.0)));
    }

    #[test]
    fn test_frame_bounds() {
        let mut camera = CameraController::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        let bounds = Bounds3::from_corners(DVec3::new(1.0, 1.0, 1.0), DVec3::new(3.0, 3.0, 3.0));
        camera.frame_bounds(&bounds);

        assert_eq!(camera.at, DVec3::new(2.0, 2.0, 2.0));
        assert!((camera.distance() - 2.0 * 12.0_f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_frame_empty_bounds_falls_back_to_origin() {
        let mut camera = CameraController::new(DVec3::new(4.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0), DVec3::Y);
        camera.frame_bounds(&Bounds3::EMPTY);

        assert_eq!(camera.at, DVec3::ZERO);
        assert!(approx(camera.eye, DVec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_reset_restores_eye_and_at() {
        let mut camera = CameraController::for_up_axis(UpAxis::Z);
        camera.orbit(DVec2::new(13.0, -7.0));
        camera.pan(DVec2::new(42.0, 5.0));
        camera.zoom(-100.0);
        camera.reset();

        assert_eq!(camera.eye, DVec3::new(5.0, 3.0, 5.0));
        assert_eq!(camera.at, DVec3::new(0.0, 0.0, 0.0));
        // Up is not part of the reset
        assert_eq!(camera.up, DVec3::Z);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let camera = CameraController::default();
        let eye_in_view = camera.view_matrix().transform_point3(camera.eye);

        assert!(eye_in_view.length() < EPS);
        // Target lies straight ahead on -Z
        let at_in_view = camera.view_matrix().transform_point3(camera.at);
        assert!(at_in_view.z < 0.0);
        assert!(at_in_view.x.abs() < EPS && at_in_view.y.abs() < EPS);
    }

    #[test]
    fn test_transform_is_inverse_of_view() {
        let camera = CameraController::default();
        let product = camera.transform() * camera.view_matrix();

        assert!(product.abs_diff_eq(DMat4::IDENTITY, 1e-9));
        assert!(approx(camera.transform().w_axis.truncate(), camera.eye));
    }

    #[test]
    fn test_degenerate_up_produces_nan() {
        let camera = CameraController::new(DVec3::new(0.0, 5.0, 0.0), DVec3::ZERO, DVec3::Y);
        let view = camera.view_matrix();

        assert!(view.is_nan() || !view.is_finite());
    }
}
