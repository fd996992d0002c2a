//! SIMD-aware math primitives shared across the renderer.
//!
//! This crate is the leaf of the workspace: every other `lumen_*` crate
//! depends on it, nothing here depends on them. It provides three things:
//!
//! - thin re-exports of [`glam`] vector/matrix types for scalar 3-D math
//!   (camera transforms, shading frames, sampling);
//! - [`wide`], a portable N-wide float/int lane type used by the BVH
//!   traversal kernel and the triangle intersector to test several boxes or
//!   triangles against one ray without committing to a specific target's
//!   SIMD intrinsics;
//! - [`aabb`] and [`sampling`], small self-contained helpers layered on top
//!   of the above.

pub mod aabb;
pub mod sampling;
pub mod wide;

/// 3-component vector; a thin alias so call sites read `math::Vec3` rather
/// than importing `glam` directly.
pub type Vec3 = glam::Vec3;
/// 2-component vector, used for UV coordinates and 2-D samples.
pub type Vec2 = glam::Vec2;
/// 4x4 affine transform, used for camera and instance transforms.
pub type Mat4 = glam::Mat4;
/// Compact affine transform (3x4), preferred over `Mat4` wherever the last
/// row is always `(0, 0, 0, 1)`.
pub type Affine3A = glam::Affine3A;

pub use aabb::Aabb;
pub use wide::{FloatN, MaskN, LANES};

/// Reflects `wi` about `n`. Both vectors are expected to be normalized;
/// `wi` points away from the surface (towards the viewer/previous vertex).
#[inline]
#[must_use]
pub fn reflect(wi: Vec3, n: Vec3) -> Vec3 {
    2.0 * wi.dot(n) * n - wi
}

/// Refracts `wi` through a surface with normal `n` and relative index of
/// refraction `eta` (incident-side IOR over transmitted-side IOR).
/// Returns `None` on total internal reflection.
#[inline]
#[must_use]
pub fn refract(wi: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = wi.dot(n);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some(-eta * wi + (eta * cos_i - cos_t) * n)
}

/// Builds an orthonormal basis around a unit vector `n`, following the
/// branchless construction from Duff et al. ("Building an Orthonormal
/// Basis, Revisited"). Returns `(tangent, bitangent)`.
#[inline]
#[must_use]
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0_f32 } else { -1.0_f32 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;
    let t = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bt = Vec3::new(b, sign + n.y * n.y * a, -n.y);
    (t, bt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reflect_about_flat_normal() {
        let wi = Vec3::new(0.0, 0.0, 1.0);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let wo = reflect(wi, n);
        assert_relative_eq!(wo.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(wo.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn orthonormal_basis_is_orthogonal() {
        let n = Vec3::new(0.2, 0.8, 0.3).normalize();
        let (t, b) = orthonormal_basis(n);
        assert_relative_eq!(t.dot(n), 0.0, epsilon = 1e-5);
        assert_relative_eq!(b.dot(n), 0.0, epsilon = 1e-5);
        assert_relative_eq!(t.dot(b), 0.0, epsilon = 1e-5);
        assert_relative_eq!(t.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(b.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn total_internal_reflection_returns_none() {
        // Going from dense (eta = 1/1.5) to less dense medium at a grazing angle.
        let n = Vec3::new(0.0, 0.0, 1.0);
        let wi = Vec3::new(0.99, 0.0, 0.01).normalize();
        assert!(refract(wi, n, 1.5).is_none());
    }
}
