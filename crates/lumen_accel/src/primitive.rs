use lumen_math::{aabb::Aabb, Vec3};

/// One triangle as seen by the BVH builder: which mesh/face-set/face it
/// names, plus its precomputed bounds and centroid so the builder never
/// has to re-derive geometry mid-build.
#[derive(Debug, Clone, Copy)]
pub struct Primitive {
    pub mesh: lumen_geometry::MeshId,
    pub face_set: u32,
    pub face: u32,
    pub bounds: Aabb,
    pub centroid: Vec3,
}

impl Primitive {
    #[must_use]
    pub fn new(mesh: lumen_geometry::MeshId, face_set: u32, face: u32, bounds: Aabb) -> Self {
        Primitive {
            mesh,
            face_set,
            face,
            centroid: bounds.centroid(),
            bounds,
        }
    }
}
