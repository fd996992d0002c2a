//! The host-embedding boundary: an opaque-handle session interface, a YAML
//! scene descriptor, and a geometry-archive importer. Everything in this
//! crate is the adapter layer between an external host (an interactive
//! editor's render-engine plugin, a scene-asset pipeline) and the
//! self-contained rendering core in the other `lumen_*` crates — nothing
//! here is on the render hot path.

mod archive;
mod descriptor;
mod error;
mod session;

pub use archive::{
    default_material, import, resolve_material_id, ArchiveCamera, ArchiveContent, ArchiveMesh, ArchiveNode,
    ImportResult, ImportedCamera, ImportedMesh,
};
pub use descriptor::{CameraDescriptor, DataEntry, MaterialNode, MaterialParameter, ParameterValue, ShaderRef, SceneDescriptor};
pub use error::{NumericWarnings, RenderError, Result};
pub use session::{new_buffer_sink, Engine, EngineConfig, Region, SessionHandle};
