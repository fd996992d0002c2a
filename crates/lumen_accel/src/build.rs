//! Binned-SAH builder for the `N`-wide BVH.
//!
//! Each node's immediate children are produced by repeatedly binary-splitting
//! the widest still-splittable candidate range until either [`WIDTH`]
//! children exist or nothing left is worth splitting — collapsing what would
//! otherwise be several levels of a binary tree into one wide node. A
//! candidate that is still too large when the loop stops because the node
//! is already full recurses into its own [`MbvhNode`].

use crate::node::{ChildSlot, MbvhNode, WIDTH};
use crate::primitive::Primitive;
use crate::triangle::TriangleRecord;
use crate::TriangleSource;
use lumen_math::aabb::Aabb;

const NUM_BINS: usize = 12;

#[derive(Clone, Copy)]
struct BinInfo {
    count: u32,
    bounds: Aabb,
}

impl BinInfo {
    fn empty() -> Self {
        BinInfo {
            count: 0,
            bounds: Aabb::EMPTY,
        }
    }
}

struct Split {
    axis: usize,
    bin: usize,
    cost: f32,
}

#[derive(Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    bounds: Aabb,
    centroid_bounds: Aabb,
}

impl Candidate {
    fn count(&self) -> usize {
        self.end - self.start
    }
}

fn range_bounds(prims: &[Primitive], start: usize, end: usize) -> (Aabb, Aabb) {
    let mut bounds = Aabb::EMPTY;
    let mut centroid_bounds = Aabb::EMPTY;
    for p in &prims[start..end] {
        bounds = bounds.union(&p.bounds);
        centroid_bounds.extend(p.centroid);
    }
    (bounds, centroid_bounds)
}

fn centroid_bin(centroid_axis: f32, cb_min: f32, cb_max: f32) -> usize {
    let extent = cb_max - cb_min;
    let offset = if extent > f32::EPSILON {
        (centroid_axis - cb_min) / extent
    } else {
        0.0
    };
    ((offset * NUM_BINS as f32) as usize).min(NUM_BINS - 1)
}

fn axis_component(v: lumen_math::Vec3, axis: usize) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

/// Finds the minimum-cost binned-SAH split across all three axes for
/// `candidate`. Returns `None` only when every axis is centroid-degenerate
/// (all primitives share one centroid), in which case the candidate cannot
/// be usefully split any further.
fn find_best_split(prims: &[Primitive], candidate: &Candidate) -> Option<Split> {
    let mut best: Option<Split> = None;

    for axis in 0..3 {
        if candidate.centroid_bounds.is_degenerate_on(axis) {
            continue;
        }
        let cb_min = axis_component(candidate.centroid_bounds.min, axis);
        let cb_max = axis_component(candidate.centroid_bounds.max, axis);

        let mut bins = [BinInfo::empty(); NUM_BINS];
        for p in &prims[candidate.start..candidate.end] {
            let b = centroid_bin(axis_component(p.centroid, axis), cb_min, cb_max);
            bins[b].count += 1;
            bins[b].bounds = bins[b].bounds.union(&p.bounds);
        }

        for split_bin in 0..NUM_BINS - 1 {
            let mut left = Aabb::EMPTY;
            let mut left_count = 0u32;
            for bin in &bins[..=split_bin] {
                left = left.union(&bin.bounds);
                left_count += bin.count;
            }
            let mut right = Aabb::EMPTY;
            let mut right_count = 0u32;
            for bin in &bins[split_bin + 1..] {
                right = right.union(&bin.bounds);
                right_count += bin.count;
            }
            if left_count == 0 || right_count == 0 {
                continue;
            }
            let parent_area = candidate.bounds.half_area().max(f32::EPSILON);
            let cost =
                (left_count as f32 * left.half_area() + right_count as f32 * right.half_area())
                    / parent_area;

            if best.as_ref().is_none_or(|b| cost < b.cost) {
                best = Some(Split {
                    axis,
                    bin: split_bin,
                    cost,
                });
            }
        }
    }

    best
}

/// In-place partition of `prims[candidate.start..candidate.end]` by "does
/// this primitive's centroid bin fall at or before `split.bin`", mirroring
/// `std::partition` over the same predicate. Returns the absolute split
/// index (primitives before it belong to the left child).
fn partition(prims: &mut [Primitive], candidate: &Candidate, split: &Split) -> usize {
    let cb_min = axis_component(candidate.centroid_bounds.min, split.axis);
    let cb_max = axis_component(candidate.centroid_bounds.max, split.axis);

    let mut i = candidate.start;
    let mut j = candidate.end;
    while i < j {
        let bin = centroid_bin(axis_component(prims[i].centroid, split.axis), cb_min, cb_max);
        if bin <= split.bin {
            i += 1;
        } else {
            j -= 1;
            prims.swap(i, j);
        }
    }
    i
}

/// A candidate is worth splitting when it still holds more primitives than
/// fit in one packed leaf record batch and the binned-SAH cost of splitting
/// undercuts the cost of just leaving it a (possibly multi-record) leaf.
fn splittable(prims: &[Primitive], candidate: &Candidate) -> Option<Split> {
    if candidate.count() <= 1 {
        return None;
    }
    let split = find_best_split(prims, candidate)?;
    let leaf_cost = candidate.count() as f32;
    if candidate.count() > WIDTH || leaf_cost > 1.0 + split.cost {
        Some(split)
    } else {
        None
    }
}

pub struct Builder<'a, S: TriangleSource> {
    pub nodes: Vec<MbvhNode>,
    pub records: Vec<TriangleRecord>,
    source: &'a S,
}

impl<'a, S: TriangleSource> Builder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Builder {
            nodes: Vec::new(),
            records: Vec::new(),
            source,
        }
    }

    /// Builds the node covering `prims[start..end]`, pushing it (and any
    /// recursively-built children) onto `self.nodes`, and returns its index.
    pub fn build_node(&mut self, prims: &mut [Primitive], start: usize, end: usize) -> u32 {
        let (bounds, centroid_bounds) = range_bounds(prims, start, end);
        let mut candidates = vec![Candidate {
            start,
            end,
            bounds,
            centroid_bounds,
        }];

        loop {
            if candidates.len() >= WIDTH {
                break;
            }
            let mut widest_idx = None;
            let mut widest_split: Option<Split> = None;
            let mut widest_area = f32::NEG_INFINITY;
            for (idx, c) in candidates.iter().enumerate() {
                if let Some(split) = splittable(prims, c) {
                    let area = c.bounds.half_area();
                    if area > widest_area {
                        widest_area = area;
                        widest_idx = Some(idx);
                        widest_split = Some(split);
                    }
                }
            }
            let (Some(idx), Some(split)) = (widest_idx, widest_split) else {
                break;
            };
            let c = candidates[idx];
            let mid = partition(prims, &c, &split);
            let (left_bounds, left_centroid) = range_bounds(prims, c.start, mid);
            let (right_bounds, right_centroid) = range_bounds(prims, mid, c.end);
            candidates[idx] = Candidate {
                start: c.start,
                end: mid,
                bounds: left_bounds,
                centroid_bounds: left_centroid,
            };
            candidates.push(Candidate {
                start: mid,
                end: c.end,
                bounds: right_bounds,
                centroid_bounds: right_centroid,
            });
        }

        // Reserve a slot for this node before recursing into children so
        // sibling order in `self.nodes` doesn't matter for correctness.
        let node_index = self.nodes.len() as u32;
        self.nodes.push(MbvhNode::empty());

        let mut wide_bounds = lumen_math::aabb::AabbN::empty();
        let mut children = [ChildSlot::Empty; WIDTH];

        for (lane, c) in candidates.iter().enumerate() {
            wide_bounds.set_lane(lane, &c.bounds);
            // A candidate that still holds more primitives than fit in one
            // packed record batch, after the loop above stopped promoting
            // (because this node is already full), recurses into its own
            // node rather than becoming an oversized leaf — unless it can't
            // be split any further at all (e.g. coincident centroids), in
            // which case it packs as a multi-record leaf instead.
            let needs_recursion = c.count() > WIDTH && find_best_split(prims, c).is_some();
            children[lane] = if needs_recursion {
                let child_index = self.build_node(prims, c.start, c.end);
                ChildSlot::Internal { node: child_index }
            } else {
                let first_record = self.records.len() as u32;
                let record_count = self.pack_leaf(prims, c.start, c.end);
                ChildSlot::Leaf {
                    first_record,
                    record_count,
                }
            };
        }

        self.nodes[node_index as usize] = MbvhNode {
            bounds: wide_bounds,
            children,
            child_count: candidates.len() as u8,
        };

        node_index
    }

    /// Packs `prims[start..end]` into ceil(count / WIDTH) `N`-wide triangle
    /// records, padding the final record's unused lanes, and returns the
    /// number of records emitted.
    fn pack_leaf(&mut self, prims: &[Primitive], start: usize, end: usize) -> u32 {
        let slice = &prims[start..end];
        let mut emitted = 0u32;
        for chunk in slice.chunks(WIDTH) {
            let entries: Vec<_> = chunk
                .iter()
                .map(|p| {
                    let (v0, v1, v2) = self.source.triangle_vertices(p.mesh, p.face);
                    (p.mesh, p.face_set, p.face, v0, v1, v2)
                })
                .collect();
            self.records.push(TriangleRecord::pack(&entries));
            emitted += 1;
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_geometry::MeshId;

    struct NoSource;
    impl TriangleSource for NoSource {
        fn triangle_vertices(&self, _mesh: MeshId, _face: u32) -> (lumen_math::Vec3, lumen_math::Vec3, lumen_math::Vec3) {
            (lumen_math::Vec3::ZERO, lumen_math::Vec3::ZERO, lumen_math::Vec3::ZERO)
        }
    }

    fn prim_at(x: f32) -> Primitive {
        let p = lumen_math::Vec3::new(x, 0.0, 0.0);
        Primitive::new(MeshId(0), 0, 0, Aabb::point(p))
    }

    #[test]
    fn tight_cluster_has_no_degenerate_panic_and_finds_no_split_when_coincident() {
        let prims = vec![prim_at(0.0), prim_at(0.0), prim_at(0.0)];
        let candidate = Candidate {
            start: 0,
            end: 3,
            bounds: Aabb::point(prims[0].bounds.min),
            centroid_bounds: Aabb::point(prims[0].centroid),
        };
        assert!(find_best_split(&prims, &candidate).is_none());
    }

    #[test]
    fn spread_out_primitives_yield_a_split() {
        let prims: Vec<_> = (0..16).map(|i| prim_at(i as f32 * 2.0)).collect();
        let (bounds, centroid_bounds) = range_bounds(&prims, 0, prims.len());
        let candidate = Candidate {
            start: 0,
            end: prims.len(),
            bounds,
            centroid_bounds,
        };
        let split = find_best_split(&prims, &candidate);
        assert!(split.is_some());
    }

    #[test]
    fn builder_covers_all_primitives_across_leaves() {
        let mut prims: Vec<_> = (0..37).map(|i| prim_at(i as f32)).collect();
        let source = NoSource;
        let mut builder = Builder::new(&source);
        let len = prims.len();
        builder.build_node(&mut prims, 0, len);
        let total_lanes: usize = builder.records.iter().map(|r| r.active.bits().count_ones() as usize).sum();
        assert_eq!(total_lanes, 37);
    }
}
