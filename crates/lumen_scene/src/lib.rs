//! Scene façade: aggregates meshes, materials, lights and a camera into one
//! immutable structure, builds the BVH over every mesh's triangles, and
//! validates that every face-set's material ID actually exists before the
//! render call that would otherwise dereference it.

use lumen_accel::{build_bvh, Bvh, Primitive, TriangleSource};
use lumen_camera::Camera;
use lumen_geometry::{GeometryError, Mesh, MeshId};
use lumen_integrator::IntegratorScene;
use lumen_lights::Light;
use lumen_shading::Material;

/// Incrementally assembles a [`Scene`]. Meshes are assigned dense
/// [`MeshId`]s in registration order; materials are assigned dense `u32`
/// IDs the same way.
#[derive(Default)]
pub struct SceneBuilder {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    lights: Vec<Light>,
    environment: Option<usize>,
}

impl SceneBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh, returning the [`MeshId`] it was assigned. The
    /// mesh's own `id()` is expected to already match (callers build
    /// meshes with [`lumen_geometry::MeshBuilder::build`] using the ID this
    /// would return).
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = mesh.id();
        self.meshes.push(mesh);
        id
    }

    /// The `MeshId` the next [`SceneBuilder::add_mesh`] call should build
    /// its mesh with.
    #[must_use]
    pub fn next_mesh_id(&self) -> MeshId {
        MeshId(self.meshes.len() as u32)
    }

    pub fn add_material(&mut self, material: Material) -> u32 {
        let id = self.materials.len() as u32;
        self.materials.push(material);
        id
    }

    pub fn add_light(&mut self, light: Light) {
        if matches!(light, Light::Infinite { .. }) {
            self.environment = Some(self.lights.len());
        }
        self.lights.push(light);
    }

    /// Validates every mesh's face-set material references, builds the
    /// BVH over all registered triangles, and freezes the result into a
    /// [`Scene`].
    ///
    /// # Errors
    /// Returns [`GeometryError::UndefinedMaterial`] if any face-set names a
    /// material ID outside the registered material table. Per the
    /// renderer's error taxonomy this downgrades to a warning at the
    /// caller and the offending mesh should be dropped and rebuilding
    /// retried, rather than aborting the whole scene.
    pub fn build(self, camera: Camera) -> Result<Scene, GeometryError> {
        for (mesh_index, mesh) in self.meshes.iter().enumerate() {
            for (face_set_index, face_set) in mesh.face_sets().iter().enumerate() {
                if face_set.material_id as usize >= self.materials.len() {
                    log::warn!(
                        "mesh {mesh_index} face-set {face_set_index} references undefined material {}",
                        face_set.material_id
                    );
                    return Err(GeometryError::UndefinedMaterial {
                        face_set: face_set_index,
                        material_id: face_set.material_id,
                    });
                }
            }
        }

        let mut primitives = Vec::new();
        for mesh in &self.meshes {
            for face in 0..mesh.face_count() as u32 {
                let face_set = mesh.face_set_for_face(face);
                primitives.push(Primitive::new(mesh.id(), face_set, face, mesh.bounds(face)));
            }
        }

        log::debug!(
            "building scene: {} meshes, {} triangles, {} materials, {} lights",
            self.meshes.len(),
            primitives.len(),
            self.materials.len(),
            self.lights.len()
        );

        let source = MeshesSource(&self.meshes);
        let bvh = build_bvh(primitives, &source);

        Ok(Scene {
            meshes: self.meshes,
            materials: self.materials,
            lights: self.lights,
            environment: self.environment,
            camera,
            bvh,
        })
    }
}

struct MeshesSource<'a>(&'a [Mesh]);

impl TriangleSource for MeshesSource<'_> {
    fn triangle_vertices(&self, mesh: MeshId, face: u32) -> (lumen_math::Vec3, lumen_math::Vec3, lumen_math::Vec3) {
        self.0[mesh.0 as usize].triangle_vertices(face)
    }
}

/// An immutable, renderable scene: every mesh's triangles flattened into
/// one BVH, a dense material table, a light list, and a camera. Built once
/// per [`lumen_integrator::IntegratorScene::reset`]-style rebuild and
/// shared read-only (`Arc<Scene>`) across render workers.
pub struct Scene {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    lights: Vec<Light>,
    environment: Option<usize>,
    camera: Camera,
    bvh: Bvh,
}

impl Scene {
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

impl TriangleSource for Scene {
    fn triangle_vertices(&self, mesh: MeshId, face: u32) -> (lumen_math::Vec3, lumen_math::Vec3, lumen_math::Vec3) {
        self.meshes[mesh.0 as usize].triangle_vertices(face)
    }
}

impl IntegratorScene for Scene {
    fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0 as usize)
    }

    fn material_for(&self, mesh: MeshId, face_set: u32) -> Option<u32> {
        let mesh = self.meshes.get(mesh.0 as usize)?;
        mesh.face_sets().get(face_set as usize).map(|set| set.material_id)
    }

    fn material(&self, id: u32) -> Option<&Material> {
        self.materials.get(id as usize)
    }

    fn lights(&self) -> &[Light] {
        &self.lights
    }

    fn environment(&self) -> Option<&Light> {
        self.environment.map(|idx| &self.lights[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_bsdf::Lobe;
    use lumen_camera::Camera;
    use lumen_geometry::{MeshBuilder, NormalLayout};
    use lumen_math::{Affine3A, Vec2, Vec3};
    use lumen_shading::ClosureNode;

    fn quad_mesh(id: MeshId) -> Mesh {
        let mut b = MeshBuilder::new();
        b.set_positions(vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ]);
        b.set_faces(vec![[0, 1, 2], [0, 2, 3]]);
        b.build(id).unwrap()
    }

    fn test_camera() -> Camera {
        Camera::pinhole(Affine3A::IDENTITY, 1.0, 64, 64)
    }

    #[test]
    fn undefined_material_reference_is_rejected_at_build() {
        let mut builder = SceneBuilder::new();
        let mut mesh_builder = MeshBuilder::new();
        mesh_builder.set_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        mesh_builder.set_faces(vec![[0, 1, 2]]);
        mesh_builder.add_face_set(5, vec![0]);
        let mesh = mesh_builder.build(builder.next_mesh_id()).unwrap();
        builder.add_mesh(mesh);
        let err = builder.build(test_camera()).unwrap_err();
        assert!(matches!(err, GeometryError::UndefinedMaterial { material_id: 5, .. }));
    }

    #[test]
    fn scene_builds_a_bvh_covering_every_mesh() {
        let mut builder = SceneBuilder::new();
        let id = builder.next_mesh_id();
        builder.add_mesh(quad_mesh(id));
        builder.add_material(Material::new(ClosureNode::Lobe {
            lobe: Lobe::Lambert { albedo: Vec3::splat(0.5) },
            weight: Vec3::ONE,
        }));
        let scene = builder.build(test_camera()).unwrap();
        assert_eq!(scene.mesh_count(), 1);
        assert_eq!(scene.material_count(), 1);
        assert!(scene.bvh.node_count() > 0 || scene.bvh.record_count() > 0);
    }

    #[test]
    fn infinite_light_is_exposed_as_the_environment() {
        let mut builder = SceneBuilder::new();
        builder.add_light(Light::Infinite { radiance: Vec3::splat(0.2) });
        let scene = builder.build(test_camera()).unwrap();
        assert!(scene.environment().is_some());
    }

    #[test]
    fn uv_layout_mesh_builds_cleanly() {
        let mut b = MeshBuilder::new();
        b.set_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        b.set_uvs(vec![Vec2::ZERO, Vec2::X, Vec2::Y], NormalLayout::PerVertex);
        b.set_faces(vec![[0, 1, 2]]);
        assert!(b.build(MeshId(0)).is_ok());
    }
}
