/// Exact Fresnel reflectance for an unpolarized dielectric interface.
/// `cos_i` is signed (negative when the ray approaches from inside);
/// `eta` is the ratio of the incident-side IOR over the transmitted-side
/// IOR.
#[must_use]
pub fn fresnel_dielectric(cos_i: f32, eta: f32) -> f32 {
    let cos_i = cos_i.clamp(-1.0, 1.0);
    let (cos_i, eta) = if cos_i < 0.0 {
        (-cos_i, 1.0 / eta)
    } else {
        (cos_i, eta)
    };

    let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
    if sin2_t >= 1.0 {
        return 1.0; // total internal reflection
    }
    let cos_t = (1.0 - sin2_t).max(0.0).sqrt();

    let r_parallel = (eta * cos_i - cos_t) / (eta * cos_i + cos_t);
    let r_perp = (cos_i - eta * cos_t) / (cos_i + eta * cos_t);
    0.5 * (r_parallel * r_parallel + r_perp * r_perp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_incidence_matches_schlick_r0() {
        let eta = 1.5;
        let r0 = ((eta - 1.0) / (eta + 1.0)).powi(2);
        assert_relative_eq!(fresnel_dielectric(1.0, eta), r0, epsilon = 1e-4);
    }

    #[test]
    fn grazing_angle_approaches_total_reflection() {
        assert!(fresnel_dielectric(0.01, 1.5) > 0.9);
    }

    #[test]
    fn total_internal_reflection_returns_one() {
        // Going from the denser medium (eta = n_i / n_t > 1) at a shallow
        // grazing angle crosses the critical angle.
        assert_relative_eq!(fresnel_dielectric(0.05, 1.5), 1.0, epsilon = 1e-4);
    }
}
