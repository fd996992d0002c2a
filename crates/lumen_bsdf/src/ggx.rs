//! Anisotropic GGX microfacet distribution, Smith masking-shadowing, and
//! visible-normal importance sampling (Heitz 2018).

use lumen_math::Vec3;
use std::f32::consts::{PI, TAU};

/// Normal distribution function, `h` in the local (z-up) shading frame.
#[must_use]
pub fn d_ggx(h: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
    let hx2 = (h.x * h.x) / (alpha_x * alpha_x);
    let hy2 = (h.y * h.y) / (alpha_y * alpha_y);
    let hz2 = h.z * h.z;
    let denom = hx2 + hy2 + hz2;
    1.0 / (PI * alpha_x * alpha_y * denom * denom).max(1e-12)
}

fn lambda(w: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
    let cos2 = w.z * w.z;
    let sin2 = (1.0 - cos2).max(0.0);
    if sin2 <= 1e-8 {
        return 0.0;
    }
    let tan2 = sin2 / cos2.max(1e-8);
    let cos_phi2 = (w.x * w.x) / sin2;
    let sin_phi2 = (w.y * w.y) / sin2;
    let alpha2 = cos_phi2 * alpha_x * alpha_x + sin_phi2 * alpha_y * alpha_y;
    0.5 * ((1.0 + alpha2 * tan2).sqrt() - 1.0)
}

/// Smith masking term for a single direction.
#[must_use]
pub fn g1(w: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
    1.0 / (1.0 + lambda(w, alpha_x, alpha_y))
}

/// Separable Smith masking-shadowing for the pair `(wi, wo)`.
#[must_use]
pub fn g_smith(wi: Vec3, wo: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
    g1(wi, alpha_x, alpha_y) * g1(wo, alpha_x, alpha_y)
}

/// Samples a visible half-vector given the view direction `wi`, following
/// Heitz's "Sampling the GGX Distribution of Visible Normals".
#[must_use]
pub fn sample_vndf(wi: Vec3, alpha_x: f32, alpha_y: f32, u1: f32, u2: f32) -> Vec3 {
    let vh = Vec3::new(alpha_x * wi.x, alpha_y * wi.y, wi.z)
        .try_normalize()
        .unwrap_or(Vec3::Z);

    let len_sq = vh.x * vh.x + vh.y * vh.y;
    let t1 = if len_sq > 0.0 {
        Vec3::new(-vh.y, vh.x, 0.0) / len_sq.sqrt()
    } else {
        Vec3::X
    };
    let t2 = vh.cross(t1);

    let r = u1.sqrt();
    let phi = TAU * u2;
    let p1 = r * phi.cos();
    let s = 0.5 * (1.0 + vh.z);
    let p2 = (1.0 - s) * (1.0 - p1 * p1).max(0.0).sqrt() + s * (r * phi.sin());

    let nh = p1 * t1 + p2 * t2 + (1.0 - p1 * p1 - p2 * p2).max(0.0).sqrt() * vh;

    Vec3::new(alpha_x * nh.x, alpha_y * nh.y, nh.z.max(1e-6)).normalize()
}

/// Pdf of a half-vector `h` sampled by [`sample_vndf`] for view direction
/// `wi`, expressed with respect to solid angle around `h`.
#[must_use]
pub fn pdf_vndf(wi: Vec3, h: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
    let cos_i = wi.z.abs().max(1e-6);
    g1(wi, alpha_x, alpha_y) * d_ggx(h, alpha_x, alpha_y) * wi.dot(h).max(0.0) / cos_i
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn isotropic_normal_incidence_peaks_at_the_macro_normal() {
        let h = Vec3::Z;
        let d = d_ggx(h, 0.1, 0.1);
        assert!(d > 1.0);
    }

    #[test]
    fn smith_g1_is_bounded_in_unit_interval() {
        let w = Vec3::new(0.3, 0.1, 0.9).normalize();
        let g = g1(w, 0.2, 0.2);
        assert!((0.0..=1.0).contains(&g));
    }

    #[test]
    fn sampled_half_vector_is_unit_length_and_upper_hemisphere() {
        let wi = Vec3::new(0.2, 0.1, 0.95).normalize();
        let h = sample_vndf(wi, 0.3, 0.3, 0.4, 0.6);
        assert_relative_eq!(h.length(), 1.0, epsilon = 1e-4);
        assert!(h.z >= 0.0);
    }

    #[test]
    fn masking_shadowing_vanishes_at_grazing_angle() {
        let grazing = Vec3::new(0.999, 0.0, 0.001).normalize();
        let g = g1(grazing, 0.5, 0.5);
        assert!(g < 0.2);
    }
}
