use crate::area::AreaLight;
use lumen_geometry::MeshId;
use lumen_math::sampling::{uniform_cone, uniform_sphere};
use lumen_math::{orthonormal_basis, Vec3};
use std::f32::consts::TAU;

/// Result of sampling a light from a shading point: enough for the
/// integrator to build a shadow ray and weight its NEE contribution.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    pub radiance: Vec3,
    pub direction: Vec3,
    pub distance: f32,
    pub pdf: f32,
    pub is_delta: bool,
    pub mesh: Option<MeshId>,
    pub face: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum Light {
    Point { position: Vec3, intensity: Vec3 },
    Area(AreaLight),
    Distant { direction: Vec3, cos_theta_max: f32, radiance: Vec3 },
    Infinite { radiance: Vec3 },
}

impl Light {
    #[must_use]
    pub fn is_delta(&self) -> bool {
        match self {
            Light::Point { .. } => true,
            Light::Area(_) | Light::Infinite { .. } => false,
            Light::Distant { cos_theta_max, .. } => *cos_theta_max >= 1.0 - 1e-6,
        }
    }

    /// Samples a direction from `shading_point` toward this light using the
    /// uniform 2-D sample `(u, v)`. Returns `None` only when the light has
    /// nothing to sample (e.g. a degenerate, zero-area `Area` light).
    #[must_use]
    pub fn sample(&self, shading_point: Vec3, u: f32, v: f32) -> Option<LightSample> {
        match self {
            Light::Point { position, intensity } => {
                let delta = *position - shading_point;
                let distance = delta.length();
                if distance <= 1e-8 {
                    return None;
                }
                let direction = delta / distance;
                Some(LightSample {
                    radiance: *intensity / (distance * distance),
                    direction,
                    distance,
                    pdf: 1.0,
                    is_delta: true,
                    mesh: None,
                    face: None,
                })
            }
            Light::Area(area) => {
                let (point, normal, mesh, face) = area.sample_surface(u, v)?;
                let delta = point - shading_point;
                let distance = delta.length();
                if distance <= 1e-8 {
                    return None;
                }
                let direction = delta / distance;
                let cos_light = normal.dot(-direction).abs();
                if cos_light <= 1e-8 {
                    return None;
                }
                let pdf = area.area_pdf() * (distance * distance) / cos_light;
                Some(LightSample {
                    radiance: area.radiance,
                    direction,
                    distance,
                    pdf,
                    is_delta: false,
                    mesh: Some(mesh),
                    face: Some(face),
                })
            }
            Light::Distant { direction, cos_theta_max, radiance } => {
                let to_light = -*direction;
                if self.is_delta() {
                    return Some(LightSample {
                        radiance: *radiance,
                        direction: to_light,
                        distance: f32::INFINITY,
                        pdf: 1.0,
                        is_delta: true,
                        mesh: None,
                        face: None,
                    });
                }
                let (t, b) = orthonormal_basis(to_light);
                let (local, pdf) = uniform_cone(u, v, *cos_theta_max);
                let world = t * local.x + b * local.y + to_light * local.z;
                Some(LightSample {
                    radiance: *radiance,
                    direction: world,
                    distance: f32::INFINITY,
                    pdf,
                    is_delta: false,
                    mesh: None,
                    face: None,
                })
            }
            Light::Infinite { radiance } => {
                let direction = uniform_sphere(u, v);
                Some(LightSample {
                    radiance: *radiance,
                    direction,
                    distance: f32::INFINITY,
                    pdf: 1.0 / (4.0 * std::f32::consts::PI),
                    is_delta: false,
                    mesh: None,
                    face: None,
                })
            }
        }
    }

    /// Solid-angle pdf of sampling `direction` from `shading_point` toward
    /// this light by chance. Zero for delta lights: they can never be hit
    /// except by explicit sampling, so a BSDF-sampled ray that happens to
    /// line up must not double-count them during MIS.
    #[must_use]
    pub fn pdf(&self, shading_point: Vec3, direction: Vec3) -> f32 {
        match self {
            Light::Point { .. } => 0.0,
            Light::Area(area) => match area.intersect(shading_point, direction) {
                Some((distance, normal)) => {
                    let cos_light = normal.dot(-direction).abs();
                    if cos_light <= 1e-8 {
                        0.0
                    } else {
                        area.area_pdf() * (distance * distance) / cos_light
                    }
                }
                None => 0.0,
            },
            Light::Distant { direction: light_dir, cos_theta_max, .. } => {
                let cos_theta = (-*light_dir).dot(direction);
                if cos_theta >= *cos_theta_max && *cos_theta_max < 1.0 {
                    1.0 / (TAU * (1.0 - *cos_theta_max))
                } else {
                    0.0
                }
            }
            Light::Infinite { .. } => 1.0 / (4.0 * std::f32::consts::PI),
        }
    }

    /// Evaluates environment radiance for a ray that missed all geometry;
    /// only meaningful for [`Light::Infinite`].
    #[must_use]
    pub fn environment_radiance(&self) -> Option<Vec3> {
        match self {
            Light::Infinite { radiance } => Some(*radiance),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::LightTriangle;

    #[test]
    fn point_light_falls_off_with_inverse_square_distance() {
        let light = Light::Point { position: Vec3::new(0.0, 0.0, 2.0), intensity: Vec3::splat(4.0) };
        let sample = light.sample(Vec3::ZERO, 0.0, 0.0).unwrap();
        assert!((sample.distance - 2.0).abs() < 1e-5);
        assert!((sample.radiance.x - 1.0).abs() < 1e-5);
        assert!(sample.is_delta);
    }

    #[test]
    fn point_light_has_zero_bsdf_hit_pdf() {
        let light = Light::Point { position: Vec3::new(0.0, 0.0, 2.0), intensity: Vec3::ONE };
        assert_eq!(light.pdf(Vec3::ZERO, Vec3::Z), 0.0);
    }

    #[test]
    fn area_light_sample_direction_points_toward_the_quad() {
        let quad = vec![
            LightTriangle {
                mesh: MeshId(0),
                face: 0,
                v0: Vec3::new(-1.0, -1.0, 5.0),
                v1: Vec3::new(1.0, -1.0, 5.0),
                v2: Vec3::new(1.0, 1.0, 5.0),
            },
            LightTriangle {
                mesh: MeshId(0),
                face: 1,
                v0: Vec3::new(-1.0, -1.0, 5.0),
                v1: Vec3::new(1.0, 1.0, 5.0),
                v2: Vec3::new(-1.0, 1.0, 5.0),
            },
        ];
        let light = Light::Area(AreaLight::new(quad, Vec3::splat(10.0)));
        let sample = light.sample(Vec3::ZERO, 0.4, 0.3).unwrap();
        assert!(sample.direction.z > 0.0);
        assert!(sample.pdf > 0.0);
        assert!(!sample.is_delta);
    }

    #[test]
    fn infinite_light_uniform_pdf_is_constant() {
        let light = Light::Infinite { radiance: Vec3::ONE };
        let a = light.pdf(Vec3::ZERO, Vec3::X);
        let b = light.pdf(Vec3::ZERO, Vec3::Z);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn distant_light_zero_angular_radius_is_a_delta() {
        let light = Light::Distant { direction: Vec3::Z, cos_theta_max: 1.0, radiance: Vec3::ONE };
        assert!(light.is_delta());
        assert_eq!(light.pdf(Vec3::ZERO, -Vec3::Z), 0.0);
    }
}
