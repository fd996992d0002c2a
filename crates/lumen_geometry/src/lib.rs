//! Mesh storage and the lightweight triangle view used by BVH construction
//! and area-light preprocessing.
//!
//! A [`Mesh`] is built incrementally through [`MeshBuilder`] and frozen into
//! an immutable, flat-array form — matching the data model's "flat arrays
//! of vertex positions... immutable after build" contract. Meshes never
//! mutate after [`MeshBuilder::build`] returns.

mod error;
mod mesh;
mod triangle;

pub use error::GeometryError;
pub use mesh::{FaceSet, Mesh, MeshBuilder, MeshId, NormalLayout};
pub use triangle::{triangle_area, triangle_bounds, TriangleView};
