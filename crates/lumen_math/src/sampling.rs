//! Sampling-domain warps shared by the sampler, BSDF lobes and lights.

use crate::Vec3;
use std::f32::consts::{PI, TAU};

/// Maps a uniform 2-D sample to barycentric coordinates on a triangle using
/// the area-preserving square-to-triangle warp
/// `(1 - sqrt(u), sqrt(u) * v)`.
#[inline]
#[must_use]
pub fn square_to_triangle(u: f32, v: f32) -> (f32, f32) {
    let su = u.max(0.0).sqrt();
    (1.0 - su, su * v)
}

/// Concentric (Shirley-Chiu) square-to-disk warp; lower distortion than the
/// naive polar mapping, used for aperture sampling.
#[inline]
#[must_use]
pub fn concentric_disk(u: f32, v: f32) -> (f32, f32) {
    let ox = 2.0 * u - 1.0;
    let oy = 2.0 * v - 1.0;
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }
    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, (PI / 4.0) * (oy / ox))
    } else {
        (oy, (PI / 2.0) - (PI / 4.0) * (ox / oy))
    };
    (r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted hemisphere sample in the local frame (z-up).
#[inline]
#[must_use]
pub fn cosine_hemisphere(u: f32, v: f32) -> Vec3 {
    let (x, y) = concentric_disk(u, v);
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    Vec3::new(x, y, z)
}

/// Pdf, in solid angle, of [`cosine_hemisphere`] for a direction whose
/// cosine with the local z axis is `cos_theta`.
#[inline]
#[must_use]
pub fn cosine_hemisphere_pdf(cos_theta: f32) -> f32 {
    cos_theta.max(0.0) / PI
}

/// Uniform sample over the full sphere; used for point/distant light
/// fallback sampling and unit tests.
#[inline]
#[must_use]
pub fn uniform_sphere(u: f32, v: f32) -> Vec3 {
    let z = 1.0 - 2.0 * u;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = TAU * v;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform sample over a cone of half-angle `theta_max` around local +z,
/// used for distant-light angular-radius sampling.
#[inline]
#[must_use]
pub fn uniform_cone(u: f32, v: f32, cos_theta_max: f32) -> (Vec3, f32) {
    let cos_theta = (1.0 - u) + u * cos_theta_max;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = TAU * v;
    let dir = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    let pdf = 1.0 / (TAU * (1.0 - cos_theta_max));
    (dir, pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn square_to_triangle_stays_inside_unit_triangle() {
        for i in 0..17 {
            for j in 0..17 {
                let u = i as f32 / 16.0;
                let v = j as f32 / 16.0;
                let (a, b) = square_to_triangle(u, v);
                assert!(a >= -1e-6 && b >= -1e-6 && a + b <= 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn cosine_hemisphere_is_unit_length() {
        let d = cosine_hemisphere(0.3, 0.7);
        assert_relative_eq!(d.length(), 1.0, epsilon = 1e-5);
        assert!(d.z >= 0.0);
    }

    #[test]
    fn uniform_cone_degenerates_to_point_at_zero_angle() {
        let (dir, _pdf) = uniform_cone(0.5, 0.5, 1.0);
        assert_relative_eq!(dir.z, 1.0, epsilon = 1e-4);
    }
}
