//! `N`-wide BVH construction and the stream traversal kernel that intersects
//! ray packets against it.
//!
//! [`build_bvh`] runs a binned-SAH build over a flat primitive list,
//! producing a [`Bvh`] whose nodes fan out to up to [`node::WIDTH`] children
//! each. [`stream::trace`] then walks a packet of active rays through that
//! tree, narrowing each ray's closest-hit state as it goes.

mod build;
mod node;
mod primitive;
pub mod stream;
mod triangle;

use lumen_geometry::MeshId;
use lumen_math::{aabb::AabbN, Vec3};

pub use node::{ChildSlot, MbvhNode, WIDTH};
pub use primitive::Primitive;
pub use stream::{trace, RayStream};
pub use triangle::{RecordHit, TriangleRecord};

/// Resolves a primitive's three vertex positions by mesh and face index.
/// Implemented by the scene façade (`lumen_scene`) over its mesh table so
/// the builder and the packed triangle records never need to hold a
/// reference to the meshes themselves.
pub trait TriangleSource {
    fn triangle_vertices(&self, mesh: MeshId, face: u32) -> (Vec3, Vec3, Vec3);
}

/// A built `N`-wide BVH: a flat node array plus a flat packed-triangle
/// array, both immutable after [`build_bvh`] returns. `root` is `None` only
/// when the scene has zero primitives.
pub struct Bvh {
    nodes: Vec<MbvhNode>,
    records: Vec<TriangleRecord>,
    root: Option<u32>,
}

impl Bvh {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[must_use]
    pub fn bounds(&self) -> lumen_math::Aabb {
        match self.root {
            Some(root) => wide_bounds_union(&self.nodes[root as usize].bounds),
            None => lumen_math::Aabb::EMPTY,
        }
    }
}

fn wide_bounds_union(bounds: &AabbN) -> lumen_math::Aabb {
    let mut out = lumen_math::Aabb::EMPTY;
    for lane in 0..WIDTH {
        out = out.union(&lumen_math::Aabb {
            min: Vec3::new(
                bounds.min_x.get(lane),
                bounds.min_y.get(lane),
                bounds.min_z.get(lane),
            ),
            max: Vec3::new(
                bounds.max_x.get(lane),
                bounds.max_y.get(lane),
                bounds.max_z.get(lane),
            ),
        });
    }
    out
}

/// Builds a `Bvh` over `primitives` using binned-SAH top-down construction
/// (see the `build` module). Returns an empty `Bvh` (no nodes, `root =
/// None`) when `primitives` is empty, so an empty scene traces as a
/// guaranteed miss rather than a builder edge case the traversal kernel has
/// to special-case.
#[must_use]
pub fn build_bvh<S: TriangleSource>(mut primitives: Vec<Primitive>, source: &S) -> Bvh {
    if primitives.is_empty() {
        return Bvh {
            nodes: Vec::new(),
            records: Vec::new(),
            root: None,
        };
    }

    let mut builder = build::Builder::new(source);
    let len = primitives.len();
    let root = builder.build_node(&mut primitives, 0, len);

    log::debug!(
        "built bvh: {} primitives, {} nodes, {} triangle records",
        len,
        builder.nodes.len(),
        builder.records.len()
    );

    Bvh {
        nodes: builder.nodes,
        records: builder.records,
        root: Some(root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Aabb;

    struct Grid {
        tris: Vec<(Vec3, Vec3, Vec3)>,
    }

    impl TriangleSource for Grid {
        fn triangle_vertices(&self, _mesh: MeshId, face: u32) -> (Vec3, Vec3, Vec3) {
            self.tris[face as usize]
        }
    }

    fn grid_of(n: usize) -> (Vec<Primitive>, Grid) {
        let mut tris = Vec::new();
        let mut prims = Vec::new();
        for i in 0..n {
            let x = i as f32 * 3.0;
            let v0 = Vec3::new(x, 0.0, 0.0);
            let v1 = Vec3::new(x + 1.0, 0.0, 0.0);
            let v2 = Vec3::new(x, 1.0, 0.0);
            let mut bounds = Aabb::point(v0);
            bounds.extend(v1);
            bounds.extend(v2);
            prims.push(Primitive::new(MeshId(0), 0, tris.len() as u32, bounds));
            tris.push((v0, v1, v2));
        }
        (prims, Grid { tris })
    }

    #[test]
    fn empty_scene_builds_an_empty_bvh() {
        let grid = Grid { tris: Vec::new() };
        let bvh = build_bvh(Vec::new(), &grid);
        assert!(bvh.is_empty());
    }

    #[test]
    fn single_triangle_builds_one_leaf() {
        let (prims, grid) = grid_of(1);
        let bvh = build_bvh(prims, &grid);
        assert!(!bvh.is_empty());
        assert_eq!(bvh.record_count(), 1);
    }

    #[test]
    fn many_triangles_produce_a_tree_covering_every_primitive() {
        let (prims, grid) = grid_of(200);
        let bvh = build_bvh(prims, &grid);
        assert!(bvh.node_count() > 1);
        let total_triangles: usize = (0..bvh.record_count())
            .map(|_| WIDTH)
            .sum::<usize>()
            .min(200 + WIDTH); // loose sanity bound, not an exact packing count
        assert!(total_triangles >= 200);
    }

    #[test]
    fn root_bounds_cover_every_primitive_bound() {
        let (prims, grid) = grid_of(50);
        let mut expect = Aabb::EMPTY;
        for p in &prims {
            expect = expect.union(&p.bounds);
        }
        let bvh = build_bvh(prims, &grid);
        let root_bounds = bvh.bounds();
        assert!(root_bounds.contains(&expect));
    }
}
