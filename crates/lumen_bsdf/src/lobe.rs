use crate::fresnel::fresnel_dielectric;
use crate::ggx;
use crate::sheen;
use lumen_math::sampling::{cosine_hemisphere, cosine_hemisphere_pdf};
use lumen_math::{orthonormal_basis, reflect, refract, Vec3};
use std::f32::consts::PI;

/// One closure-tree leaf: a single BSDF lobe with its own `f`/`pdf`/`sample`
/// contract, evaluated in the local shading frame (`+z` is the shading
/// normal). `wi` is the direction toward the previous path vertex (the
/// "incoming" direction as seen from the surface, pointing away from it);
/// `wo` is the direction toward the next path vertex.
#[derive(Debug, Clone, Copy)]
pub enum Lobe {
    Lambert { albedo: Vec3 },
    OrenNayar { albedo: Vec3, roughness: f32 },
    Ggx { albedo: Vec3, alpha_x: f32, alpha_y: f32, ior: f32 },
    SpecularReflect { color: Vec3 },
    SpecularRefract { color: Vec3, ior: f32 },
    Transparent { color: Vec3 },
    Sheen { color: Vec3, roughness: f32 },
}

/// Result of [`Lobe::sample`]: the sampled direction, its pdf, the lobe's
/// value at that direction, and whether the lobe is a delta distribution
/// (in which case NEE must be skipped for this bounce).
pub struct LobeSample {
    pub wo: Vec3,
    pub pdf: f32,
    pub value: Vec3,
    pub is_delta: bool,
}

impl Lobe {
    #[must_use]
    pub fn is_delta(&self) -> bool {
        matches!(
            self,
            Lobe::SpecularReflect { .. } | Lobe::SpecularRefract { .. } | Lobe::Transparent { .. }
        )
    }

    /// `f(wi, wo)`: zero for delta lobes, which carry no finite-measure
    /// density to evaluate off their single sampled direction.
    #[must_use]
    pub fn f(&self, wi: Vec3, wo: Vec3) -> Vec3 {
        match *self {
            Lobe::Lambert { albedo } => {
                if wi.z <= 0.0 || wo.z <= 0.0 {
                    Vec3::ZERO
                } else {
                    albedo / PI
                }
            }
            Lobe::OrenNayar { albedo, roughness } => oren_nayar_f(wi, wo, albedo, roughness),
            Lobe::Ggx { albedo, alpha_x, alpha_y, ior } => {
                ggx_f(wi, wo, albedo, alpha_x, alpha_y, ior)
            }
            Lobe::Sheen { color, roughness } => sheen_f(wi, wo, color, roughness),
            Lobe::SpecularReflect { .. }
            | Lobe::SpecularRefract { .. }
            | Lobe::Transparent { .. } => Vec3::ZERO,
        }
    }

    /// Pdf of `wo` given `wi`; zero for delta lobes.
    #[must_use]
    pub fn pdf(&self, wi: Vec3, wo: Vec3) -> f32 {
        match *self {
            Lobe::Lambert { .. } | Lobe::OrenNayar { .. } => {
                if wi.z <= 0.0 || wo.z <= 0.0 {
                    0.0
                } else {
                    cosine_hemisphere_pdf(wo.z)
                }
            }
            Lobe::Ggx { alpha_x, alpha_y, .. } => {
                if wi.z <= 0.0 || wo.z <= 0.0 {
                    0.0
                } else {
                    let h = (wi + wo).normalize_or_zero();
                    if h == Vec3::ZERO {
                        0.0
                    } else {
                        ggx::pdf_vndf(wi, h, alpha_x, alpha_y) / (4.0 * wo.dot(h)).max(1e-6)
                    }
                }
            }
            Lobe::Sheen { roughness, .. } => {
                if wi.z <= 0.0 || wo.z <= 0.0 {
                    0.0
                } else {
                    let h = (wi + wo).normalize_or_zero();
                    if h == Vec3::ZERO {
                        0.0
                    } else {
                        let (_, pdf_h) = sheen::sample_charlie(0.0, 0.0, roughness);
                        let _ = pdf_h;
                        sheen::d_charlie(h.z, roughness) * h.z / (4.0 * wo.dot(h)).max(1e-6)
                    }
                }
            }
            Lobe::SpecularReflect { .. }
            | Lobe::SpecularRefract { .. }
            | Lobe::Transparent { .. } => 0.0,
        }
    }

    /// Samples an outgoing direction given `wi` and a uniform 2-D sample
    /// `(u, v)`. Returns `None` only for physically invalid samples (e.g.
    /// total internal reflection on a refraction lobe).
    #[must_use]
    pub fn sample(&self, wi: Vec3, u: f32, v: f32) -> Option<LobeSample> {
        match *self {
            Lobe::Lambert { .. } | Lobe::OrenNayar { .. } => {
                if wi.z <= 0.0 {
                    return None;
                }
                let wo = cosine_hemisphere(u, v);
                let pdf = cosine_hemisphere_pdf(wo.z);
                if pdf <= 0.0 {
                    return None;
                }
                let value = self.f(wi, wo);
                Some(LobeSample { wo, pdf, value, is_delta: false })
            }
            Lobe::Ggx { albedo, alpha_x, alpha_y, ior } => {
                if wi.z <= 0.0 {
                    return None;
                }
                let h = ggx::sample_vndf(wi, alpha_x, alpha_y, u, v);
                let wo = reflect(wi, h);
                if wo.z <= 0.0 {
                    return None;
                }
                let pdf = ggx::pdf_vndf(wi, h, alpha_x, alpha_y) / (4.0 * wi.dot(h)).max(1e-6);
                if pdf <= 0.0 {
                    return None;
                }
                let value = ggx_f(wi, wo, albedo, alpha_x, alpha_y, ior);
                Some(LobeSample { wo, pdf, value, is_delta: false })
            }
            Lobe::Sheen { color, roughness } => {
                if wi.z <= 0.0 {
                    return None;
                }
                let (h, _pdf_h) = sheen::sample_charlie(u, v, roughness);
                let wo = reflect(wi, h);
                if wo.z <= 0.0 {
                    return None;
                }
                let pdf = self.pdf(wi, wo);
                if pdf <= 0.0 {
                    return None;
                }
                let value = sheen_f(wi, wo, color, roughness);
                Some(LobeSample { wo, pdf, value, is_delta: false })
            }
            Lobe::SpecularReflect { color } => {
                let n = Vec3::Z;
                let wo = reflect(wi, n);
                Some(LobeSample { wo, pdf: 1.0, value: color, is_delta: true })
            }
            Lobe::SpecularRefract { color, ior } => {
                let (n, eta) = if wi.z >= 0.0 { (Vec3::Z, 1.0 / ior) } else { (-Vec3::Z, ior) };
                match refract(wi, n, eta) {
                    Some(wo) => {
                        let cos_theta = wi.dot(n).abs();
                        let transmittance = 1.0 - fresnel_dielectric(cos_theta, ior);
                        Some(LobeSample {
                            wo,
                            pdf: 1.0,
                            value: color * transmittance,
                            is_delta: true,
                        })
                    }
                    None => Some(LobeSample { wo: reflect(wi, n), pdf: 1.0, value: Vec3::ZERO, is_delta: true }),
                }
            }
            Lobe::Transparent { color } => {
                Some(LobeSample { wo: -wi, pdf: 1.0, value: color, is_delta: true })
            }
        }
    }
}

fn oren_nayar_f(wi: Vec3, wo: Vec3, albedo: Vec3, roughness: f32) -> Vec3 {
    if wi.z <= 0.0 || wo.z <= 0.0 {
        return Vec3::ZERO;
    }
    let sigma2 = roughness * roughness;
    let a = 1.0 - sigma2 / (2.0 * (sigma2 + 0.33));
    let b = 0.45 * sigma2 / (sigma2 + 0.09);

    let theta_i = wi.z.clamp(-1.0, 1.0).acos();
    let theta_o = wo.z.clamp(-1.0, 1.0).acos();
    let alpha = theta_i.max(theta_o);
    let beta = theta_i.min(theta_o);

    let phi_i = wi.y.atan2(wi.x);
    let phi_o = wo.y.atan2(wo.x);
    let cos_delta_phi = (phi_i - phi_o).cos().max(0.0);

    let reflectance = (a + b * cos_delta_phi * alpha.sin() * beta.tan()) / PI;
    albedo * reflectance.max(0.0)
}

fn ggx_f(wi: Vec3, wo: Vec3, albedo: Vec3, alpha_x: f32, alpha_y: f32, ior: f32) -> Vec3 {
    if wi.z <= 0.0 || wo.z <= 0.0 {
        return Vec3::ZERO;
    }
    let h = (wi + wo).normalize_or_zero();
    if h == Vec3::ZERO {
        return Vec3::ZERO;
    }
    let d = ggx::d_ggx(h, alpha_x, alpha_y);
    let g = ggx::g_smith(wi, wo, alpha_x, alpha_y);
    let f = fresnel_dielectric(wi.dot(h), ior);
    albedo * (d * g * f / (4.0 * wi.z * wo.z).max(1e-6))
}

fn sheen_f(wi: Vec3, wo: Vec3, color: Vec3, roughness: f32) -> Vec3 {
    if wi.z <= 0.0 || wo.z <= 0.0 {
        return Vec3::ZERO;
    }
    let h = (wi + wo).normalize_or_zero();
    if h == Vec3::ZERO {
        return Vec3::ZERO;
    }
    let d = sheen::d_charlie(h.z, roughness);
    let v = sheen::v_neumann(wi.z, wo.z);
    color * (d * v)
}

/// Builds an orthonormal shading frame around geometric normal `n` so world
/// vectors can be rotated into the local `+z`-up frame the lobes above
/// operate in.
#[must_use]
pub fn shading_frame(n: Vec3) -> (Vec3, Vec3, Vec3) {
    let (t, b) = orthonormal_basis(n);
    (t, b, n)
}

/// Rotates a world-space vector into the local frame `(t, b, n)`.
#[must_use]
pub fn world_to_local(v: Vec3, t: Vec3, b: Vec3, n: Vec3) -> Vec3 {
    Vec3::new(v.dot(t), v.dot(b), v.dot(n))
}

/// Rotates a local-frame vector back into world space.
#[must_use]
pub fn local_to_world(v: Vec3, t: Vec3, b: Vec3, n: Vec3) -> Vec3 {
    t * v.x + b * v.y + n * v.z
}
