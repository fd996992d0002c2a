use lumen_accel::Bvh;
use lumen_geometry::{Mesh, MeshId};
use lumen_lights::Light;
use lumen_shading::Material;

/// Everything the integrator needs to read from a scene, kept as a trait so
/// this crate never depends on `lumen_scene`'s concrete façade — only the
/// façade depends on this one. `lumen_scene::Scene` is the sole real
/// implementor.
pub trait IntegratorScene {
    fn bvh(&self) -> &Bvh;
    fn mesh(&self, id: MeshId) -> Option<&Mesh>;
    fn material_for(&self, mesh: MeshId, face_set: u32) -> Option<u32>;
    fn material(&self, id: u32) -> Option<&Material>;
    fn lights(&self) -> &[Light];
    fn environment(&self) -> Option<&Light>;
}
