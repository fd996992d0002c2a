//! The stream traversal kernel: intersects a packet of active rays against
//! the `N`-wide BVH, closest-hit semantics, one pass per call.

use crate::node::{ChildSlot, WIDTH};
use crate::Bvh;
use lumen_geometry::MeshId;
use lumen_math::wide::{bitscan_forward_clear, FloatN};
use lumen_math::Vec3;

/// Structure-of-arrays packet of rays plus their current closest-hit state.
/// Shared by the camera kernel (which fills origin/direction), the
/// traversal kernel (which narrows `t_max` and fills the hit fields), and
/// the shading dispatch (which reads the hit fields back out by ray index).
pub struct RayStream {
    origin_x: Vec<f32>,
    origin_y: Vec<f32>,
    origin_z: Vec<f32>,
    dir_x: Vec<f32>,
    dir_y: Vec<f32>,
    dir_z: Vec<f32>,
    t_max: Vec<f32>,
    hit: Vec<bool>,
    bary_u: Vec<f32>,
    bary_v: Vec<f32>,
    mesh: Vec<MeshId>,
    face_set: Vec<u32>,
    face: Vec<u32>,
}

impl RayStream {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        RayStream {
            origin_x: vec![0.0; capacity],
            origin_y: vec![0.0; capacity],
            origin_z: vec![0.0; capacity],
            dir_x: vec![0.0; capacity],
            dir_y: vec![0.0; capacity],
            dir_z: vec![0.0; capacity],
            t_max: vec![f32::INFINITY; capacity],
            hit: vec![false; capacity],
            bary_u: vec![0.0; capacity],
            bary_v: vec![0.0; capacity],
            mesh: vec![MeshId(0); capacity],
            face_set: vec![0; capacity],
            face: vec![0; capacity],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.origin_x.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origin_x.is_empty()
    }

    /// Resets ray `i` to `origin`/`dir` with max distance `t_max` and clears
    /// its hit state. Called by the camera kernel for a new primary ray, and
    /// by the integrator when it spawns a continuation or shadow ray.
    pub fn set_ray(&mut self, i: usize, origin: Vec3, dir: Vec3, t_max: f32) {
        self.origin_x[i] = origin.x;
        self.origin_y[i] = origin.y;
        self.origin_z[i] = origin.z;
        self.dir_x[i] = dir.x;
        self.dir_y[i] = dir.y;
        self.dir_z[i] = dir.z;
        self.t_max[i] = t_max;
        self.hit[i] = false;
        self.bary_u[i] = 0.0;
        self.bary_v[i] = 0.0;
    }

    #[must_use]
    pub fn origin(&self, i: usize) -> Vec3 {
        Vec3::new(self.origin_x[i], self.origin_y[i], self.origin_z[i])
    }

    #[must_use]
    pub fn dir(&self, i: usize) -> Vec3 {
        Vec3::new(self.dir_x[i], self.dir_y[i], self.dir_z[i])
    }

    #[must_use]
    pub fn t_max(&self, i: usize) -> f32 {
        self.t_max[i]
    }

    #[must_use]
    pub fn is_hit(&self, i: usize) -> bool {
        self.hit[i]
    }

    /// `(mesh, face_set, face, u, v, distance)` of ray `i`'s closest hit.
    /// Only meaningful when [`Self::is_hit`] is true.
    #[must_use]
    pub fn hit_record(&self, i: usize) -> (MeshId, u32, u32, f32, f32, f32) {
        (
            self.mesh[i],
            self.face_set[i],
            self.face[i],
            self.bary_u[i],
            self.bary_v[i],
            self.t_max[i],
        )
    }

    #[inline]
    fn record_hit(&mut self, i: usize, dist: f32, u: f32, v: f32, mesh: MeshId, face_set: u32, face: u32) {
        self.t_max[i] = dist;
        self.hit[i] = true;
        self.bary_u[i] = u;
        self.bary_v[i] = v;
        self.mesh[i] = mesh;
        self.face_set[i] = face_set;
        self.face[i] = face;
    }
}

enum TaskNode {
    Internal(u32),
    Leaf { first_record: u32, record_count: u32 },
}

struct Task {
    node: TaskNode,
    rays: Vec<u32>,
}

/// Intersects every ray index in `active` against `bvh`, narrowing each
/// ray's `t_max` and recording the closest hit. Rays not in `active` are
/// left untouched (they are either already terminated or not yet spawned).
pub fn trace(stream: &mut RayStream, active: &[u32], bvh: &Bvh) {
    if bvh.root.is_none() || active.is_empty() {
        return;
    }
    let root = bvh.root.unwrap();

    let mut stack = vec![Task {
        node: TaskNode::Internal(root),
        rays: active.to_vec(),
    }];

    while let Some(task) = stack.pop() {
        match task.node {
            TaskNode::Internal(node_index) => {
                let node = &bvh.nodes[node_index as usize];
                let mut child_rays: [Vec<u32>; WIDTH] = Default::default();
                let mut child_near_sum = [0.0f32; WIDTH];

                for &ray in &task.rays {
                    let origin = stream.origin(ray as usize);
                    let dir = stream.dir(ray as usize);
                    let inv_dir = Vec3::splat(1.0) / dir;
                    let t_max = stream.t_max(ray as usize);

                    let mut dist = FloatN::ZERO;
                    let mask = node.bounds.intersect(origin, inv_dir, t_max, &mut dist);
                    let mut bits = mask.bits();
                    while let Some(lane) = bitscan_forward_clear(&mut bits) {
                        let lane = lane as usize;
                        child_rays[lane].push(ray);
                        child_near_sum[lane] += dist.get(lane);
                    }
                }

                // Order non-empty children by near-distance, farthest
                // first, so the closest child ends up on top of the stack
                // (popped first).
                let mut order: Vec<usize> = (0..node.child_count as usize)
                    .filter(|&l| !node.children[l].is_empty() && !child_rays[l].is_empty())
                    .collect();
                order.sort_by(|&a, &b| {
                    child_near_sum[b]
                        .partial_cmp(&child_near_sum[a])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                for lane in order {
                    let rays = std::mem::take(&mut child_rays[lane]);
                    let task_node = match node.children[lane] {
                        ChildSlot::Internal { node } => TaskNode::Internal(node),
                        ChildSlot::Leaf {
                            first_record,
                            record_count,
                        } => TaskNode::Leaf {
                            first_record,
                            record_count,
                        },
                        ChildSlot::Empty => unreachable!("empty child slots are filtered above"),
                    };
                    stack.push(Task {
                        node: task_node,
                        rays,
                    });
                }
            }
            TaskNode::Leaf {
                first_record,
                record_count,
            } => {
                for r in 0..record_count {
                    let record = &bvh.records[(first_record + r) as usize];
                    for &ray in &task.rays {
                        let origin = stream.origin(ray as usize);
                        let dir = stream.dir(ray as usize);
                        let t_max = stream.t_max(ray as usize);

                        let hit = record.intersect(origin, dir, t_max);
                        let mut bits = hit.mask.bits();
                        let mut best_lane = None;
                        let mut best_dist = f32::INFINITY;
                        while let Some(lane) = bitscan_forward_clear(&mut bits) {
                            let lane = lane as usize;
                            let d = hit.dist.get(lane);
                            if d < best_dist {
                                best_dist = d;
                                best_lane = Some(lane);
                            }
                        }
                        if let Some(lane) = best_lane {
                            if best_dist < stream.t_max(ray as usize) {
                                stream.record_hit(
                                    ray as usize,
                                    best_dist,
                                    hit.bary_u.get(lane),
                                    hit.bary_v.get(lane),
                                    record.mesh[lane],
                                    record.face_set[lane],
                                    record.face[lane],
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_bvh, Primitive, TriangleSource};
    use lumen_math::aabb::Aabb;

    struct SingleTriangle {
        v0: Vec3,
        v1: Vec3,
        v2: Vec3,
    }

    impl TriangleSource for SingleTriangle {
        fn triangle_vertices(&self, _mesh: MeshId, _face: u32) -> (Vec3, Vec3, Vec3) {
            (self.v0, self.v1, self.v2)
        }
    }

    fn one_triangle_bvh() -> (Bvh, SingleTriangle) {
        let v0 = Vec3::new(-1.0, -1.0, 0.0);
        let v1 = Vec3::new(1.0, -1.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);
        let source = SingleTriangle { v0, v1, v2 };
        let mut bounds = Aabb::point(v0);
        bounds.extend(v1);
        bounds.extend(v2);
        let prims = vec![Primitive::new(MeshId(0), 0, 0, bounds)];
        let bvh = build_bvh(prims, &source);
        (bvh, source)
    }

    #[test]
    fn straight_on_ray_hits_the_triangle() {
        let (bvh, _source) = one_triangle_bvh();
        let mut stream = RayStream::with_capacity(1);
        stream.set_ray(0, Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), f32::INFINITY);
        trace(&mut stream, &[0], &bvh);
        assert!(stream.is_hit(0));
        assert!((stream.t_max(0) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn ray_missing_the_triangle_reports_no_hit() {
        let (bvh, _source) = one_triangle_bvh();
        let mut stream = RayStream::with_capacity(1);
        stream.set_ray(0, Vec3::new(10.0, 10.0, -5.0), Vec3::new(0.0, 0.0, 1.0), f32::INFINITY);
        trace(&mut stream, &[0], &bvh);
        assert!(!stream.is_hit(0));
    }

    #[test]
    fn empty_bvh_never_reports_a_hit() {
        let source = SingleTriangle {
            v0: Vec3::ZERO,
            v1: Vec3::ZERO,
            v2: Vec3::ZERO,
        };
        let bvh = build_bvh(Vec::new(), &source);
        let mut stream = RayStream::with_capacity(1);
        stream.set_ray(0, Vec3::ZERO, Vec3::Z, f32::INFINITY);
        trace(&mut stream, &[0], &bvh);
        assert!(!stream.is_hit(0));
    }

    #[test]
    fn shorter_max_distance_excludes_a_farther_hit() {
        let (bvh, _source) = one_triangle_bvh();
        let mut stream = RayStream::with_capacity(1);
        stream.set_ray(0, Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 2.0);
        trace(&mut stream, &[0], &bvh);
        assert!(!stream.is_hit(0));
    }
}
