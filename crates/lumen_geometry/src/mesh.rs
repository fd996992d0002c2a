use crate::error::GeometryError;
use crate::triangle::{sample_triangle, triangle_area, triangle_bounds};
use lumen_math::{aabb::Aabb, Vec2, Vec3};

/// Dense integer ID assigned to a mesh at scene registration. IDs start at
/// 0 and never change for the lifetime of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Which attribute-indexing convention a mesh was authored with.
///
/// The two import paths in the system this was distilled from disagreed on
/// whether normals/UVs are addressed per vertex or per face-corner, and
/// left that inconsistency unresolved at integration time. This
/// implementation picks **per-vertex** as the one supported convention:
/// [`MeshBuilder::build`] asserts it and rejects anything else rather than
/// silently reinterpreting per-corner data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalLayout {
    #[default]
    PerVertex,
    PerCorner,
}

/// A contiguous run of faces bound to one material.
#[derive(Debug, Clone)]
pub struct FaceSet {
    pub material_id: u32,
    /// Indices into the mesh's face array (not vertex indices).
    pub faces: Vec<u32>,
}

/// Flat, immutable triangle mesh.
#[derive(Debug, Clone)]
pub struct Mesh {
    id: MeshId,
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    uvs: Option<Vec<Vec2>>,
    /// 3 vertex indices per face.
    indices: Vec<[u32; 3]>,
    face_sets: Vec<FaceSet>,
    /// Face index -> face-set index, precomputed at build time so shading
    /// dispatch can go straight from a hit's face ID to its material
    /// without scanning face-sets.
    face_to_set: Vec<u32>,
    normal_layout: NormalLayout,
    uv_layout: NormalLayout,
}

impl Mesh {
    #[must_use]
    pub fn id(&self) -> MeshId {
        self.id
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn face_set_count(&self) -> usize {
        self.face_sets.len()
    }

    #[must_use]
    pub fn face_sets(&self) -> &[FaceSet] {
        &self.face_sets
    }

    #[must_use]
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    #[must_use]
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Material ID a given face belongs to, looked up through the
    /// precomputed face -> face-set table.
    #[must_use]
    pub fn material_id_for_face(&self, face: u32) -> u32 {
        let set = self.face_to_set[face as usize] as usize;
        self.face_sets[set].material_id
    }

    #[must_use]
    pub fn face_set_for_face(&self, face: u32) -> u32 {
        self.face_to_set[face as usize]
    }

    fn vertex_positions(&self, face: u32) -> (Vec3, Vec3, Vec3) {
        let [i0, i1, i2] = self.indices[face as usize];
        (
            self.positions[i0 as usize],
            self.positions[i1 as usize],
            self.positions[i2 as usize],
        )
    }

    #[must_use]
    pub fn bounds(&self, face: u32) -> Aabb {
        let (v0, v1, v2) = self.vertex_positions(face);
        triangle_bounds(v0, v1, v2)
    }

    #[must_use]
    pub fn area(&self, face: u32) -> f32 {
        let (v0, v1, v2) = self.vertex_positions(face);
        triangle_area(v0, v1, v2)
    }

    /// Raw vertex positions of a face's triangle, used by the BVH builder
    /// and triangle intersector to read edge vectors directly.
    #[must_use]
    pub fn triangle_vertices(&self, face: u32) -> (Vec3, Vec3, Vec3) {
        self.vertex_positions(face)
    }

    /// Geometric (true, unshaded) normal of `face`, independent of any
    /// authored vertex normals. Used by the integrator to offset shadow and
    /// continuation rays off the surface.
    #[must_use]
    pub fn geometric_normal(&self, face: u32) -> Vec3 {
        let (v0, v1, v2) = self.vertex_positions(face);
        (v1 - v0).cross(v2 - v0).normalize_or_zero()
    }

    /// Samples a uniformly-distributed surface point on `face` from a
    /// uniform 2-D sample; used by area lights.
    #[must_use]
    pub fn sample(&self, face: u32, u: f32, v: f32) -> (Vec3, [f32; 3]) {
        let (v0, v1, v2) = self.vertex_positions(face);
        sample_triangle(v0, v1, v2, u, v)
    }

    /// Interpolates shading position, shading normal and UV at barycentric
    /// `(u, v)` (with `w = 1 - u - v`) on `face`.
    #[must_use]
    pub fn shading_parameters(&self, face: u32, u: f32, v: f32) -> (Vec3, Vec3, Vec2) {
        let w = 1.0 - u - v;
        let [i0, i1, i2] = self.indices[face as usize];
        let (p0, p1, p2) = self.vertex_positions(face);
        let position = p0 * w + p1 * u + p2 * v;

        let normal = match &self.normals {
            Some(normals) => {
                let n0 = normals[i0 as usize];
                let n1 = normals[i1 as usize];
                let n2 = normals[i2 as usize];
                (n0 * w + n1 * u + n2 * v).normalize_or_zero()
            }
            None => (p1 - p0).cross(p2 - p0).normalize_or_zero(),
        };

        let uv = match &self.uvs {
            Some(uvs) => {
                let uv0 = uvs[i0 as usize];
                let uv1 = uvs[i1 as usize];
                let uv2 = uvs[i2 as usize];
                uv0 * w + uv1 * u + uv2 * v
            }
            None => Vec2::new(u, v),
        };

        (position, normal, uv)
    }
}

/// Incrementally fills a mesh's flat arrays, then freezes them into a
/// [`Mesh`]. Mirrors the "builder that fills vertex/normal/uv/face/face-set
/// arrays then freezes" contract.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    uvs: Option<Vec<Vec2>>,
    indices: Vec<[u32; 3]>,
    face_sets: Vec<FaceSet>,
    normal_layout: NormalLayout,
    uv_layout: NormalLayout,
}

impl MeshBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_positions(&mut self, positions: Vec<Vec3>) -> &mut Self {
        self.positions = positions;
        self
    }

    pub fn set_normals(&mut self, normals: Vec<Vec3>, layout: NormalLayout) -> &mut Self {
        self.normals = Some(normals);
        self.normal_layout = layout;
        self
    }

    pub fn set_uvs(&mut self, uvs: Vec<Vec2>, layout: NormalLayout) -> &mut Self {
        self.uvs = Some(uvs);
        self.uv_layout = layout;
        self
    }

    pub fn set_faces(&mut self, indices: Vec<[u32; 3]>) -> &mut Self {
        self.indices = indices;
        self
    }

    pub fn add_face_set(&mut self, material_id: u32, faces: Vec<u32>) -> &mut Self {
        self.face_sets.push(FaceSet { material_id, faces });
        self
    }

    /// Validates and freezes the builder into an immutable [`Mesh`].
    ///
    /// # Errors
    /// Returns [`GeometryError`] if the mesh has no faces, a face-set is
    /// empty, a face-set's face index is out of range, a face references
    /// an out-of-range vertex, attribute array lengths disagree, or
    /// normals/UVs are laid out per-corner (unsupported, see
    /// [`NormalLayout`]).
    pub fn build(self, id: MeshId) -> Result<Mesh, GeometryError> {
        if self.indices.is_empty() {
            return Err(GeometryError::ZeroTriangles);
        }

        if self.normals.is_some() && self.normal_layout != NormalLayout::PerVertex {
            return Err(GeometryError::UnsupportedLayout);
        }
        if self.uvs.is_some() && self.uv_layout != NormalLayout::PerVertex {
            return Err(GeometryError::UnsupportedLayout);
        }

        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(GeometryError::MismatchedLengths {
                    positions: self.positions.len(),
                    attribute: "normals",
                    len: normals.len(),
                });
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != self.positions.len() {
                return Err(GeometryError::MismatchedLengths {
                    positions: self.positions.len(),
                    attribute: "uvs",
                    len: uvs.len(),
                });
            }
        }

        for (face, tri) in self.indices.iter().enumerate() {
            for &index in tri {
                if index as usize >= self.positions.len() {
                    return Err(GeometryError::VertexIndexOutOfRange { face, index });
                }
            }
        }

        let mut face_to_set = vec![u32::MAX; self.indices.len()];
        for (set_idx, set) in self.face_sets.iter().enumerate() {
            if set.faces.is_empty() {
                return Err(GeometryError::EmptyFaceSet { face_set: set_idx });
            }
            for &face in &set.faces {
                face_to_set[face as usize] = set_idx as u32;
            }
        }
        // Faces not claimed by any explicit face-set fall into an implicit
        // set 0 pointing at material 0, matching a single-material mesh
        // built without face-sets at all.
        if self.face_sets.is_empty() {
            face_to_set.fill(0);
        }

        Ok(Mesh {
            id,
            positions: self.positions,
            normals: self.normals,
            uvs: self.uvs,
            indices: self.indices,
            face_sets: if self.face_sets.is_empty() {
                vec![FaceSet {
                    material_id: 0,
                    faces: (0..face_to_set.len() as u32).collect(),
                }]
            } else {
                self.face_sets
            },
            face_to_set,
            normal_layout: self.normal_layout,
            uv_layout: self.uv_layout,
        })
    }
}
