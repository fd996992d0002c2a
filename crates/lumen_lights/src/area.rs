use lumen_geometry::MeshId;
use lumen_math::sampling::square_to_triangle;
use lumen_math::Vec3;

/// One triangle bound to an area light, carrying enough identity that a
/// sampled point can be traced back to the mesh it came from.
#[derive(Debug, Clone, Copy)]
pub struct LightTriangle {
    pub mesh: MeshId,
    pub face: u32,
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

/// Preprocessed area light: a CDF over per-triangle area, built once at
/// scene setup, used to pick a triangle in proportion to its contribution
/// to the light's total area.
#[derive(Debug, Clone)]
pub struct AreaLight {
    triangles: Vec<LightTriangle>,
    cdf: Vec<f32>,
    total_area: f32,
    pub radiance: Vec3,
}

impl AreaLight {
    #[must_use]
    pub fn new(triangles: Vec<LightTriangle>, radiance: Vec3) -> Self {
        let mut cdf = Vec::with_capacity(triangles.len());
        let mut running = 0.0_f32;
        for t in &triangles {
            running += triangle_area(t.v0, t.v1, t.v2);
            cdf.push(running);
        }
        AreaLight { triangles, cdf, total_area: running, radiance }
    }

    #[must_use]
    pub fn total_area(&self) -> f32 {
        self.total_area
    }

    #[must_use]
    pub fn triangles(&self) -> &[LightTriangle] {
        &self.triangles
    }

    /// Picks a triangle in proportion to area via binary search over the
    /// CDF using `u`, remaps `u` into that triangle's own unit square, and
    /// warps to a barycentric surface point.
    ///
    /// Returns `(point, geometric_normal, mesh, face)`, or `None` if the
    /// light has zero triangles or degenerate (zero) total area.
    #[must_use]
    pub fn sample_surface(&self, u: f32, v: f32) -> Option<(Vec3, Vec3, MeshId, u32)> {
        if self.triangles.is_empty() || self.total_area <= 0.0 {
            return None;
        }
        let target = u * self.total_area;
        let idx = self.cdf.partition_point(|&c| c < target).min(self.triangles.len() - 1);

        let prev = if idx == 0 { 0.0 } else { self.cdf[idx - 1] };
        let span = (self.cdf[idx] - prev).max(1e-12);
        let u_local = ((target - prev) / span).clamp(0.0, 1.0);

        let t = &self.triangles[idx];
        let (b1, b2) = square_to_triangle(u_local, v);
        let b0 = 1.0 - b1 - b2;
        let point = t.v0 * b0 + t.v1 * b1 + t.v2 * b2;
        let normal = (t.v1 - t.v0).cross(t.v2 - t.v0).normalize_or_zero();
        Some((point, normal, t.mesh, t.face))
    }

    /// `1 / total_area`, the light's area-measure sampling density; the
    /// caller converts this to a solid-angle pdf at the shading point.
    #[must_use]
    pub fn area_pdf(&self) -> f32 {
        if self.total_area <= 0.0 {
            0.0
        } else {
            1.0 / self.total_area
        }
    }

    /// Intersects `ray` against every triangle in the light (brute force —
    /// area lights are typically a handful of triangles), returning the
    /// closest hit distance and geometric normal, used to compute the
    /// solid-angle pdf of an arbitrary direction for MIS.
    #[must_use]
    pub fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<(f32, Vec3)> {
        let mut closest: Option<(f32, Vec3)> = None;
        for t in &self.triangles {
            if let Some((dist, n)) = intersect_triangle(origin, dir, t.v0, t.v1, t.v2) {
                if closest.map_or(true, |(best, _)| dist < best) {
                    closest = Some((dist, n));
                }
            }
        }
        closest
    }
}

fn triangle_area(v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
    (v1 - v0).cross(v2 - v0).length() * 0.5
}

fn intersect_triangle(origin: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<(f32, Vec3)> {
    const EPSILON: f32 = 1e-8;
    let e0 = v1 - v0;
    let e1 = v2 - v0;
    let p = dir.cross(e1);
    let det = e0.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let t = origin - v0;
    let u = t.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = t.cross(e0);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let dist = e1.dot(q) * inv_det;
    if dist <= EPSILON {
        return None;
    }
    Some((dist, e0.cross(e1).normalize_or_zero()))
}
