//! Transforms pixel samples into primary rays.
//!
//! Camera convention: looks down `-Z` in its own local frame (a right-handed
//! convention), matching the way the scene graph's own camera type builds
//! its view basis from `forward = -Z`. `transform` is the camera's
//! world matrix (camera space -> world space), not a view matrix.

use lumen_math::sampling::concentric_disk;
use lumen_math::{Affine3A, Vec3};

/// A camera ready to emit primary rays. Projection is always perspective;
/// `fov_y` is the full vertical field of view in radians.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Affine3A,
    pub fov_y: f32,
    pub film_width: u32,
    pub film_height: u32,
    /// `0.0` disables depth of field (a pinhole camera).
    pub aperture_radius: f32,
    pub focal_distance: f32,
}

impl Camera {
    #[must_use]
    pub fn pinhole(transform: Affine3A, fov_y_radians: f32, film_width: u32, film_height: u32) -> Self {
        Camera {
            transform,
            fov_y: fov_y_radians,
            film_width,
            film_height,
            aperture_radius: 0.0,
            focal_distance: 1.0,
        }
    }

    #[must_use]
    fn aspect(&self) -> f32 {
        self.film_width as f32 / self.film_height as f32
    }

    /// Generates a primary ray for pixel `(x, y)` (top-left origin, `0 <= x
    /// < film_width`) with sub-pixel jitter `(jx, jy)` in `[0, 1)`. `lens_uv`
    /// is a uniform 2-D sample used only when `aperture_radius > 0`.
    ///
    /// Returns `(origin, direction)`; `direction` is normalized.
    #[must_use]
    pub fn generate_ray(&self, x: u32, y: u32, jx: f32, jy: f32, lens_uv: (f32, f32)) -> (Vec3, Vec3) {
        let w = self.film_width as f32;
        let h = self.film_height as f32;

        let ndc_x = (x as f32 + jx + 0.5) / w - 0.5;
        let ndc_y = 0.5 - (y as f32 + jy + 0.5) / h;

        let tan_half_fov = (self.fov_y * 0.5).tan();
        let aspect = self.aspect();

        let dir_camera = Vec3::new(
            ndc_x * aspect * tan_half_fov,
            ndc_y * tan_half_fov,
            -1.0,
        );

        let mut origin_camera = Vec3::ZERO;
        let mut dir = dir_camera;

        if self.aperture_radius > 0.0 {
            let focal_point = dir_camera * self.focal_distance;
            let (lx, ly) = concentric_disk(lens_uv.0, lens_uv.1);
            origin_camera = Vec3::new(lx * self.aperture_radius, ly * self.aperture_radius, 0.0);
            dir = focal_point - origin_camera;
        }

        let world_dir = self.transform.transform_vector3(dir).normalize();
        let world_origin = self.transform.transform_point3(origin_camera);
        (world_origin, world_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_pixel_points_down_forward_axis() {
        let camera = Camera::pinhole(Affine3A::IDENTITY, std::f32::consts::FRAC_PI_2, 100, 100);
        let (origin, dir) = camera.generate_ray(49, 49, 0.5, 0.5, (0.0, 0.0));
        assert_relative_eq!(origin, Vec3::ZERO, epsilon = 1e-5);
        assert_relative_eq!(dir.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(dir.y, 0.0, epsilon = 1e-3);
        assert!(dir.z < 0.0);
    }

    #[test]
    fn wider_fov_spreads_corner_rays_further_from_axis() {
        let narrow = Camera::pinhole(Affine3A::IDENTITY, 0.3, 100, 100);
        let wide = Camera::pinhole(Affine3A::IDENTITY, 1.2, 100, 100);
        let (_, d_narrow) = narrow.generate_ray(99, 0, 0.0, 0.0, (0.0, 0.0));
        let (_, d_wide) = wide.generate_ray(99, 0, 0.0, 0.0, (0.0, 0.0));
        assert!(d_wide.x.abs() > d_narrow.x.abs());
    }

    #[test]
    fn depth_of_field_displaces_origin_off_axis() {
        let mut camera = Camera::pinhole(Affine3A::IDENTITY, std::f32::consts::FRAC_PI_2, 100, 100);
        camera.aperture_radius = 0.5;
        camera.focal_distance = 5.0;
        let (origin, _) = camera.generate_ray(49, 49, 0.5, 0.5, (0.9, 0.3));
        assert!(origin.x != 0.0 || origin.y != 0.0);
    }

    #[test]
    fn rotated_camera_transforms_direction_into_world_space() {
        let transform = Affine3A::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let camera = Camera::pinhole(transform, std::f32::consts::FRAC_PI_2, 100, 100);
        let (_, dir) = camera.generate_ray(49, 49, 0.5, 0.5, (0.0, 0.0));
        // Looking down -Z rotated 90 degrees about Y points down -X.
        assert_relative_eq!(dir.x, -1.0, epsilon = 1e-3);
        assert_relative_eq!(dir.z, 0.0, epsilon = 1e-3);
    }
}
