use thiserror::Error;

/// Errors raised while freezing a [`crate::MeshBuilder`] into a [`crate::Mesh`].
///
/// Per the renderer's error taxonomy these are `GeometryError`s: they
/// downgrade to a warning at the scene-façade level and drop the offending
/// mesh rather than aborting the render (see `lumen_scene`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// The mesh has no faces at all.
    #[error("mesh yielded zero triangles")]
    ZeroTriangles,

    /// A face-set references a material ID outside the scene's material
    /// table. The mesh itself doesn't know the table's size; this is
    /// raised by the caller (`lumen_scene`) that does.
    #[error("face-set {face_set} references undefined material {material_id}")]
    UndefinedMaterial { face_set: usize, material_id: u32 },

    /// A face-set was registered with no faces.
    #[error("face-set {face_set} has no faces")]
    EmptyFaceSet { face_set: usize },

    /// `normals` is present but the mesh's normal layout flag is not
    /// `PerVertex`. This implementation only supports per-vertex normals
    /// and UVs (see the resolved open question in the design notes); a
    /// per-corner mesh must be re-expanded to per-vertex before import.
    #[error("unsupported normal/uv layout: per-corner attributes are not supported")]
    UnsupportedLayout,

    /// `positions`, `normals` or `uvs` arrays disagree in length.
    #[error("mismatched attribute array lengths: positions={positions}, {attribute}={len}")]
    MismatchedLengths {
        positions: usize,
        attribute: &'static str,
        len: usize,
    },

    /// A face index references a vertex outside the `positions` array.
    #[error("face {face} references out-of-range vertex index {index}")]
    VertexIndexOutOfRange { face: usize, index: u32 },
}
