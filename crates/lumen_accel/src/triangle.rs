use lumen_geometry::MeshId;
use lumen_math::wide::{FloatN, MaskN, LANES};
use lumen_math::Vec3;

/// `N`-wide packed triangle record: up to [`LANES`] triangles' vertex `v0`
/// and edges `e0 = v1 - v0`, `e1 = v2 - v0` stored structure-of-arrays, plus
/// the mesh/face-set/face identity of each lane so a hit can be scattered
/// straight back into the shading arrays.
///
/// Unused lanes (padding out a leaf whose primitive count isn't a multiple
/// of `LANES`) are filled with a degenerate all-zero triangle and marked
/// inactive in `active`, so they participate in the SIMD test but can never
/// produce a hit (their edges are zero vectors, so `det` is zero and the
/// lane is rejected by the `|det| < eps` guard before `active` is even
/// consulted).
#[derive(Debug, Clone)]
pub struct TriangleRecord {
    v0x: FloatN,
    v0y: FloatN,
    v0z: FloatN,
    e0x: FloatN,
    e0y: FloatN,
    e0z: FloatN,
    e1x: FloatN,
    e1y: FloatN,
    e1z: FloatN,
    pub mesh: [MeshId; LANES],
    pub face_set: [u32; LANES],
    pub face: [u32; LANES],
    pub active: MaskN,
}

/// Result of testing one ray against a whole [`TriangleRecord`].
pub struct RecordHit {
    pub mask: MaskN,
    pub dist: FloatN,
    pub bary_u: FloatN,
    pub bary_v: FloatN,
}

const DET_EPSILON: f32 = 1e-8;

impl TriangleRecord {
    /// Builds a record from up to [`LANES`] `(mesh, face_set, face, v0, v1,
    /// v2)` tuples. Fewer than `LANES` entries pads the remaining lanes
    /// with an inactive degenerate triangle.
    #[must_use]
    pub fn pack(entries: &[(MeshId, u32, u32, Vec3, Vec3, Vec3)]) -> Self {
        debug_assert!(entries.len() <= LANES);
        let mut rec = TriangleRecord {
            v0x: FloatN::ZERO,
            v0y: FloatN::ZERO,
            v0z: FloatN::ZERO,
            e0x: FloatN::ZERO,
            e0y: FloatN::ZERO,
            e0z: FloatN::ZERO,
            e1x: FloatN::ZERO,
            e1y: FloatN::ZERO,
            e1z: FloatN::ZERO,
            mesh: [MeshId(0); LANES],
            face_set: [0; LANES],
            face: [0; LANES],
            active: MaskN::ALL_FALSE,
        };
        let mut active = [false; LANES];
        for (lane, &(mesh, face_set, face, v0, v1, v2)) in entries.iter().enumerate() {
            let e0 = v1 - v0;
            let e1 = v2 - v0;
            rec.v0x.set(lane, v0.x);
            rec.v0y.set(lane, v0.y);
            rec.v0z.set(lane, v0.z);
            rec.e0x.set(lane, e0.x);
            rec.e0y.set(lane, e0.y);
            rec.e0z.set(lane, e0.z);
            rec.e1x.set(lane, e1.x);
            rec.e1y.set(lane, e1.y);
            rec.e1z.set(lane, e1.z);
            rec.mesh[lane] = mesh;
            rec.face_set[lane] = face_set;
            rec.face[lane] = face;
            active[lane] = true;
        }
        rec.active = MaskN(active);
        rec
    }

    /// Tests one ray against every lane of this record using SIMD
    /// Möller–Trumbore. `d_current` is the ray's current max distance;
    /// a lane only accepts a hit strictly closer than it.
    #[must_use]
    pub fn intersect(&self, origin: Vec3, dir: Vec3, d_current: f32) -> RecordHit {
        let ox = FloatN::splat(origin.x);
        let oy = FloatN::splat(origin.y);
        let oz = FloatN::splat(origin.z);
        let dx = FloatN::splat(dir.x);
        let dy = FloatN::splat(dir.y);
        let dz = FloatN::splat(dir.z);

        // p = wi x e1
        let px = dy * self.e1z - dz * self.e1y;
        let py = dz * self.e1x - dx * self.e1z;
        let pz = dx * self.e1y - dy * self.e1x;

        // det = e0 . p
        let det = self.e0x * px + self.e0y * py + self.e0z * pz;
        let det_ok = det.abs_gt(FloatN::splat(DET_EPSILON));
        let inv_det = det.recip();

        // t = o - v0
        let tx = ox - self.v0x;
        let ty = oy - self.v0y;
        let tz = oz - self.v0z;

        // u = (t . p) / det
        let u = (tx * px + ty * py + tz * pz) * inv_det;

        // q = t x e0
        let qx = ty * self.e0z - tz * self.e0y;
        let qy = tz * self.e0x - tx * self.e0z;
        let qz = tx * self.e0y - ty * self.e0x;

        // v = (wi . q) / det
        let v = (dx * qx + dy * qy + dz * qz) * inv_det;

        // d = (e1 . q) / det
        let d = (self.e1x * qx + self.e1y * qy + self.e1z * qz) * inv_det;

        let zero = FloatN::ZERO;
        let one = FloatN::splat(1.0);
        let u_ok = u.ge(zero);
        let v_ok = v.ge(zero);
        let uv_ok = (u + v).le(one);
        let d_ok = d.ge(zero) & d.lt(FloatN::splat(d_current));

        let mask = det_ok & u_ok & v_ok & uv_ok & d_ok & self.active;

        RecordHit {
            mask,
            dist: d,
            bary_u: u,
            bary_v: v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> (Vec3, Vec3, Vec3) {
        (
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn straight_on_ray_hits_single_lane_record() {
        let (v0, v1, v2) = unit_triangle();
        let rec = TriangleRecord::pack(&[(MeshId(0), 0, 5, v0, v1, v2)]);
        let hit = rec.intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), f32::INFINITY);
        assert!(hit.mask.0[0]);
        assert!((hit.dist.get(0) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn ray_missing_triangle_sets_no_lane() {
        let (v0, v1, v2) = unit_triangle();
        let rec = TriangleRecord::pack(&[(MeshId(0), 0, 5, v0, v1, v2)]);
        let hit = rec.intersect(Vec3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0), f32::INFINITY);
        assert!(!hit.mask.any());
    }

    #[test]
    fn hit_farther_than_current_distance_is_rejected() {
        let (v0, v1, v2) = unit_triangle();
        let rec = TriangleRecord::pack(&[(MeshId(0), 0, 5, v0, v1, v2)]);
        let hit = rec.intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 2.0);
        assert!(!hit.mask.any());
    }

    #[test]
    fn padding_lanes_never_report_a_hit() {
        let (v0, v1, v2) = unit_triangle();
        let rec = TriangleRecord::pack(&[(MeshId(0), 0, 5, v0, v1, v2)]);
        let hit = rec.intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), f32::INFINITY);
        for lane in 1..LANES {
            assert!(!hit.mask.0[lane]);
        }
    }

    #[test]
    fn barycentrics_sum_to_at_most_one_on_hit() {
        let (v0, v1, v2) = unit_triangle();
        let rec = TriangleRecord::pack(&[(MeshId(0), 0, 5, v0, v1, v2)]);
        let hit = rec.intersect(Vec3::new(0.1, -0.2, -5.0), Vec3::new(0.0, 0.0, 1.0), f32::INFINITY);
        assert!(hit.mask.0[0]);
        assert!(hit.bary_u.get(0) + hit.bary_v.get(0) <= 1.0 + 1e-5);
    }
}
