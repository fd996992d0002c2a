//! The Charlie ("sheen") distribution: a retro-reflective, velvet-like lobe
//! that peaks at grazing angles rather than at the mirror direction.

use lumen_math::Vec3;
use std::f32::consts::TAU;

/// `D_charlie(cos(theta_h), roughness)`. `roughness` is clamped away from
/// zero since the distribution is undefined there.
#[must_use]
pub fn d_charlie(cos_theta_h: f32, roughness: f32) -> f32 {
    let r = roughness.max(1e-3);
    let sin_theta_h = (1.0 - cos_theta_h * cos_theta_h).max(0.0).sqrt();
    (2.0 + 1.0 / r) / TAU * sin_theta_h.powf(1.0 / r)
}

/// Neumann visibility term for the sheen lobe.
#[must_use]
pub fn v_neumann(cos_i: f32, cos_o: f32) -> f32 {
    let denom = 4.0 * (cos_i + cos_o - cos_i * cos_o);
    if denom <= 1e-6 {
        0.0
    } else {
        1.0 / denom
    }
}

/// Inverse-CDF importance sample of the Charlie distribution's half-vector
/// in the local frame. Approximate closed-form inversion of the marginal
/// `sin(theta)^(1/r)` distribution (exact in the isotropic, grazing-peaked
/// limit as `r -> 0`).
#[must_use]
pub fn sample_charlie(u1: f32, u2: f32, roughness: f32) -> (Vec3, f32) {
    let r = roughness.max(1e-3);
    let phi = TAU * u1;
    let exponent = r / (r + 1.0);
    let cos_theta_h = (1.0 - u2).powf(exponent).clamp(0.0, 1.0);
    let sin_theta_h = (1.0 - cos_theta_h * cos_theta_h).max(0.0).sqrt();
    let h = Vec3::new(sin_theta_h * phi.cos(), sin_theta_h * phi.sin(), cos_theta_h);
    let pdf = (d_charlie(cos_theta_h, r) * cos_theta_h).max(1e-6);
    (h, pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distribution_peaks_toward_grazing_not_normal_incidence() {
        let at_normal = d_charlie(1.0, 0.3);
        let at_grazing = d_charlie(0.1, 0.3);
        assert!(at_grazing > at_normal);
    }

    #[test]
    fn visibility_term_is_positive_away_from_grazing() {
        assert!(v_neumann(0.7, 0.7) > 0.0);
    }

    #[test]
    fn visibility_term_vanishes_at_double_grazing() {
        assert_relative_eq!(v_neumann(0.0, 0.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn sampled_half_vector_is_normalized_and_upper_hemisphere() {
        let (h, pdf) = sample_charlie(0.3, 0.6, 0.4);
        assert_relative_eq!(h.length(), 1.0, epsilon = 1e-4);
        assert!(h.z >= 0.0);
        assert!(pdf > 0.0);
    }
}
