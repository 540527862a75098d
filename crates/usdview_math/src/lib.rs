// Re-export glam for convenience
pub use glam::*;

// UsdView math types
mod bounds;
mod camera;
mod transform;

pub use bounds::Bounds3;
pub use camera::{CameraController, UpAxis};
pub use transform::RotateExt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dvec3_creation() {
        let v = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_dmat4_downcast_for_gpu() {
        let m = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0));
        let f = m.as_mat4();
        assert_eq!(f.w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));
    }
}
