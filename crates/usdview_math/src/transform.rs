// Rotation utilities for DVec3
//
// Extends glam::DVec3 with the degree-based axis rotation the camera
// controller composes its orbit from.

use glam::{DQuat, DVec3};

/// Extension trait for DVec3 rotations about an arbitrary axis
pub trait RotateExt {
    /// Rotate the vector about `axis` by `degrees` (right-hand rule).
    /// The axis does not need to be normalized; a zero axis yields NaN.
    fn rotate_about(self, axis: DVec3, degrees: f64) -> DVec3;
}

impl RotateExt for DVec3 {
    fn rotate_about(self, axis: DVec3, degrees: f64) -> DVec3 {
        let rotation = DQuat::from_axis_angle(axis.normalize(), degrees.to_radians());
        rotation * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_about_y_quarter_turn() {
        // X rotated 90 degrees about +Y points to -Z
        let v = DVec3::X.rotate_about(DVec3::Y, 90.0);

        assert!((v - DVec3::NEG_Z).length() < 1e-9);
    }

    #[test]
    fn test_rotate_preserves_length() {
        let v = DVec3::new(5.0, 3.0, 5.0);
        let rotated = v.rotate_about(DVec3::new(1.0, 2.0, -0.5), 37.5);

        assert!((rotated.length() - v.length()).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_unnormalized_axis() {
        let a = DVec3::Z.rotate_about(DVec3::X * 10.0, 45.0);
        let b = DVec3::Z.rotate_about(DVec3::X, 45.0);

        assert!((a - b).length() < 1e-12);
    }

    #[test]
    fn test_rotate_zero_degrees_is_identity() {
        let v = DVec3::new(-2.0, 0.5, 7.0);
        let rotated = v.rotate_about(DVec3::Y, 0.0);

        assert!((rotated - v).length() < 1e-12);
    }
}
