use crate::lobe::{Lobe, LobeSample};
use lumen_math::Vec3;
use smallvec::SmallVec;

/// Inline capacity covers the common case (a couple of lobes layered by a
/// closure tree) without an allocation; wider materials spill to the heap.
const INLINE_LOBES: usize = 4;

/// A weighted lobe contributed by one node of a material's closure tree.
#[derive(Debug, Clone, Copy)]
pub struct WeightedLobe {
    pub lobe: Lobe,
    pub weight: Vec3,
}

/// A flattened stack of weighted lobes evaluated as their sum. This is the
/// unit the integrator samples and evaluates at a shading point; the
/// closure-tree walk that builds it lives in the shading crate.
#[derive(Debug, Clone, Default)]
pub struct Bsdf {
    lobes: SmallVec<[WeightedLobe; INLINE_LOBES]>,
}

/// Outcome of [`Bsdf::sample`].
pub struct BsdfSample {
    pub wo: Vec3,
    pub pdf: f32,
    pub value: Vec3,
    pub is_delta: bool,
}

impl Bsdf {
    #[must_use]
    pub fn new() -> Self {
        Self { lobes: SmallVec::new() }
    }

    pub fn push(&mut self, lobe: Lobe, weight: Vec3) {
        self.lobes.push(WeightedLobe { lobe, weight });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lobes.is_empty()
    }

    #[must_use]
    pub fn lobe_count(&self) -> usize {
        self.lobes.len()
    }

    /// True if every lobe in the stack is a delta distribution, i.e. NEE
    /// has no finite-measure direction to sample against.
    #[must_use]
    pub fn is_purely_specular(&self) -> bool {
        !self.lobes.is_empty() && self.lobes.iter().all(|wl| wl.lobe.is_delta())
    }

    /// Sum of every non-delta lobe's weighted `f(wi, wo)`. Delta lobes are
    /// zero-measure and contribute nothing here; they are only reachable via
    /// [`Bsdf::sample`], which NEE callers must special-case.
    #[must_use]
    pub fn f(&self, wi: Vec3, wo: Vec3) -> Vec3 {
        self.lobes
            .iter()
            .filter(|wl| !wl.lobe.is_delta())
            .map(|wl| wl.lobe.f(wi, wo) * wl.weight)
            .fold(Vec3::ZERO, |acc, v| acc + v)
    }

    /// Combined pdf of `wo` under uniform lobe selection (`1 / L` averaging).
    /// Delta lobes contribute zero since they can never be hit by chance.
    #[must_use]
    pub fn pdf(&self, wi: Vec3, wo: Vec3) -> f32 {
        if self.lobes.is_empty() {
            return 0.0;
        }
        let inv_n = 1.0 / self.lobes.len() as f32;
        self.lobes.iter().map(|wl| wl.lobe.pdf(wi, wo)).sum::<f32>() * inv_n
    }

    /// Picks one lobe uniformly via `u01.0`, remaps it to reuse for that
    /// lobe's own sampling, then combines the other lobes' `f` at the
    /// returned direction (MIS-style stack evaluation). `u01` is consumed as
    /// `(lobe selector, lobe sample u, lobe sample v)`.
    #[must_use]
    pub fn sample(&self, wi: Vec3, u01: (f32, f32, f32)) -> Option<BsdfSample> {
        let n = self.lobes.len();
        if n == 0 {
            return None;
        }
        let (u_select, u, v) = u01;
        let k = ((u_select * n as f32) as usize).min(n - 1);
        let chosen = &self.lobes[k];

        let picked = chosen.lobe.sample(wi, u, v)?;
        let is_delta = picked.is_delta;
        let wo = picked.wo;

        if is_delta {
            // Delta lobes carry the entire measure at `wo`; other lobes are
            // finite-density and contribute zero probability of producing
            // this exact direction, so the stack value is just this lobe's.
            return Some(BsdfSample {
                wo,
                pdf: picked.pdf / n as f32,
                value: picked.value * chosen.weight,
                is_delta: true,
            });
        }

        let mut value = picked.value * chosen.weight;
        let mut pdf_sum = picked.pdf;
        for (i, wl) in self.lobes.iter().enumerate() {
            if i == k {
                continue;
            }
            value += wl.lobe.f(wi, wo) * wl.weight;
            pdf_sum += wl.lobe.pdf(wi, wo);
        }
        let pdf = pdf_sum / n as f32;
        if pdf <= 0.0 {
            return None;
        }
        Some(BsdfSample { wo, pdf, value, is_delta: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn up(z: f32) -> Vec3 {
        Vec3::new(0.0, 0.0, z)
    }

    #[test]
    fn empty_stack_has_zero_pdf_and_no_sample() {
        let bsdf = Bsdf::new();
        assert_eq!(bsdf.pdf(up(1.0), up(1.0)), 0.0);
        assert!(bsdf.sample(up(1.0), (0.1, 0.2, 0.3)).is_none());
    }

    #[test]
    fn single_lambert_lobe_matches_the_bare_lobe() {
        let mut bsdf = Bsdf::new();
        bsdf.push(Lobe::Lambert { albedo: Vec3::splat(0.5) }, Vec3::ONE);
        let f = bsdf.f(up(1.0), up(1.0));
        assert_relative_eq!(f.x, 0.5 / std::f32::consts::PI, epsilon = 1e-5);
    }

    #[test]
    fn two_lambert_lobes_sum_their_weighted_contributions() {
        let mut bsdf = Bsdf::new();
        bsdf.push(Lobe::Lambert { albedo: Vec3::splat(0.2) }, Vec3::ONE);
        bsdf.push(Lobe::Lambert { albedo: Vec3::splat(0.3) }, Vec3::ONE);
        let f = bsdf.f(up(1.0), up(1.0));
        assert_relative_eq!(f.x, 0.5 / std::f32::consts::PI, epsilon = 1e-5);
    }

    #[test]
    fn delta_lobe_in_a_stack_reports_zero_finite_pdf_contribution() {
        let mut bsdf = Bsdf::new();
        bsdf.push(Lobe::SpecularReflect { color: Vec3::ONE }, Vec3::ONE);
        bsdf.push(Lobe::Lambert { albedo: Vec3::splat(0.5) }, Vec3::ONE);
        // pdf at an arbitrary non-mirror direction comes only from the
        // Lambert lobe, averaged over both stack entries.
        let wo = Vec3::new(0.3, 0.2, 0.9).normalize();
        let pdf = bsdf.pdf(up(1.0), wo);
        let lambert_pdf = Lobe::Lambert { albedo: Vec3::splat(0.5) }.pdf(up(1.0), wo);
        assert_relative_eq!(pdf, lambert_pdf / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn stack_of_only_delta_lobes_is_purely_specular() {
        let mut bsdf = Bsdf::new();
        bsdf.push(Lobe::SpecularReflect { color: Vec3::ONE }, Vec3::ONE);
        bsdf.push(Lobe::Transparent { color: Vec3::ONE }, Vec3::ONE);
        assert!(bsdf.is_purely_specular());
    }

    #[test]
    fn mixed_stack_is_not_purely_specular() {
        let mut bsdf = Bsdf::new();
        bsdf.push(Lobe::SpecularReflect { color: Vec3::ONE }, Vec3::ONE);
        bsdf.push(Lobe::Lambert { albedo: Vec3::ONE }, Vec3::ONE);
        assert!(!bsdf.is_purely_specular());
    }

    #[test]
    fn sampling_selects_among_lobes_and_returns_a_valid_direction() {
        let mut bsdf = Bsdf::new();
        bsdf.push(Lobe::Lambert { albedo: Vec3::ONE }, Vec3::ONE);
        bsdf.push(Lobe::Lambert { albedo: Vec3::ONE }, Vec3::ONE);
        let sample = bsdf.sample(up(1.0), (0.9, 0.3, 0.6)).unwrap();
        assert!(sample.wo.z >= 0.0);
        assert!(sample.pdf > 0.0);
    }
}
