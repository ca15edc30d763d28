//! Vector and matrix types
//!
//! nalgebra aliases used by the camera, particle pool and scene renderer, plus
//! the projection helpers for Vulkan's clip space.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// Single-precision 3-vector
pub type Vec3 = Vector3<f32>;

/// Single-precision 4-vector, also used for RGBA colors
pub type Vec4 = Vector4<f32>;

/// Single-precision 4x4 matrix, column-major
pub type Mat4 = Matrix4<f32>;

/// Single-precision point
pub type Point3 = nalgebra::Point3<f32>;

/// Angle helpers
pub mod utils {
    /// Degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }
}

/// Transform constructors on [`Mat4`]
pub trait Mat4Ext {
    /// Rotation about +Y by `angle` radians
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a perspective projection matrix with [0, 1] depth
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Flip from the right-handed, y-up view space into Vulkan's y-down, +z-forward convention
    fn vulkan_coordinate_transform() -> Mat4;

    /// Keep only the upper 3x3 block, dropping translation
    fn without_translation(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P matrix for a view space already flipped by `vulkan_coordinate_transform`:
        // x and y divide by tan(fov/2), z maps [near, far] onto [0, 1], w takes z.
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;

        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn vulkan_coordinate_transform() -> Mat4 {
        // Flips Y (Vulkan NDC is y-down) and Z (camera looks down +Z after the flip)
        Mat4::new(
            1.0,  0.0,  0.0, 0.0,
            0.0, -1.0,  0.0, 0.0,
            0.0,  0.0, -1.0, 0.0,
            0.0,  0.0,  0.0, 1.0,
        )
    }

    fn without_translation(&self) -> Mat4 {
        self.fixed_view::<3, 3>(0, 0).into_owned().to_homogeneous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_look_at_down_negative_z_is_identity() {
        let view = Mat4::look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), Vec3::y());
        assert_relative_eq!(view, Mat4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(3.0, -3.0, 3.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());
        let transformed = view.transform_point(&Point3::from(eye));
        assert_relative_eq!(transformed.coords, Vec3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_without_translation_keeps_rotation() {
        let matrix = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)) * Mat4::rotation_y(0.3);
        let stripped = matrix.without_translation();

        assert_relative_eq!(stripped, Mat4::rotation_y(0.3), epsilon = 1e-6);
        assert_eq!(stripped[(3, 3)], 1.0);
    }

    #[test]
    fn test_perspective_depth_range() {
        let projection = Mat4::perspective(utils::deg_to_rad(45.0), 1.0, 0.1, 100.0);
        let transform = projection * Mat4::vulkan_coordinate_transform();

        // A point on the near plane in front of a look-down-minus-Z camera
        let near = transform * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = transform * Vec4::new(0.0, 0.0, -100.0, 1.0);

        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_deg_to_rad() {
        assert_relative_eq!(utils::deg_to_rad(180.0), std::f32::consts::PI);
        assert_relative_eq!(utils::deg_to_rad(45.0), std::f32::consts::FRAC_PI_4);
    }
}
