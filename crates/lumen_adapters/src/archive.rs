//! Geometry archive import: walks a read-only hierarchical scene archive,
//! accumulating each node's 4x4 double-precision transform against its
//! parent's, and collects the meshes and cameras it finds along the way in
//! world space.
//!
//! The archive's own on-disk container format is an external collaborator
//! (a baked asset pipeline's output); this module only defines the
//! in-memory tree shape an importer walks and the accumulation rule, the
//! same way the rest of this crate treats the YAML descriptor as a
//! recognized-keys contract rather than a full parser for someone else's
//! format.

use glam::{DAffine3, DMat4};
use lumen_bsdf::Lobe;
use lumen_geometry::{Mesh, MeshBuilder, MeshId};
use lumen_math::{Affine3A, Vec3};
use lumen_shading::{ClosureNode, Material};

/// Raw mesh payload as stored in an archive node, in the node's own local
/// space (not yet transformed into world space).
#[derive(Debug, Clone)]
pub struct ArchiveMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<[u32; 3]>,
    pub material_name: Option<String>,
}

/// Raw camera payload as stored in an archive node.
#[derive(Debug, Clone)]
pub struct ArchiveCamera {
    pub focal_length: f32,
    pub sensor_width: f32,
}

#[derive(Debug, Clone)]
pub enum ArchiveContent {
    Group,
    Mesh(ArchiveMesh),
    Camera(ArchiveCamera),
}

/// One node of the archive's transform hierarchy: a local 4x4 double
/// transform, optional content, and child nodes.
#[derive(Debug, Clone)]
pub struct ArchiveNode {
    pub local_transform: [[f64; 4]; 4],
    pub content: ArchiveContent,
    pub children: Vec<ArchiveNode>,
}

impl ArchiveNode {
    #[must_use]
    pub fn group(local_transform: [[f64; 4]; 4], children: Vec<ArchiveNode>) -> Self {
        ArchiveNode { local_transform, content: ArchiveContent::Group, children }
    }

    #[must_use]
    pub fn identity_group(children: Vec<ArchiveNode>) -> Self {
        Self::group(DMat4::IDENTITY.to_cols_array_2d(), children)
    }
}

/// A mesh recovered from an archive: its positions already baked into
/// world space, not yet frozen into a [`Mesh`] since that needs the
/// material ID its `material_name` resolves to against the session's
/// compiled material table, which this module has no visibility into.
pub struct ImportedMesh {
    positions: Vec<Vec3>,
    indices: Vec<[u32; 3]>,
    pub material_name: Option<String>,
}

impl ImportedMesh {
    /// Resolves `material_name` against `names` (see
    /// [`resolve_material_id`]) and freezes this mesh under a single
    /// face-set bound to that material.
    #[must_use]
    pub fn finalize(self, id: MeshId, names: &[(String, u32)]) -> Option<Mesh> {
        let material_id = resolve_material_id(self.material_name.as_deref(), names);
        let face_count = self.indices.len() as u32;
        let mut builder = MeshBuilder::new();
        builder.set_positions(self.positions);
        builder.set_faces(self.indices);
        builder.add_face_set(material_id, (0..face_count).collect());
        builder.build(id).ok()
    }
}

/// A camera recovered from an archive, in world space.
pub struct ImportedCamera {
    pub transform: Affine3A,
    pub focal_length: f32,
    pub sensor_width: f32,
}

/// Result of walking one archive: every mesh and camera found, each with
/// its accumulated world transform already applied.
#[derive(Default)]
pub struct ImportResult {
    pub meshes: Vec<ImportedMesh>,
    pub cameras: Vec<ImportedCamera>,
}

/// Walks `root`, accumulating 4x4 double transforms down the hierarchy and
/// baking every mesh/camera it finds into world space. Returned meshes
/// still need [`ImportedMesh::finalize`] with a scene-assigned
/// [`MeshId`] and the compiled material table before they're usable.
#[must_use]
pub fn import(root: &ArchiveNode) -> ImportResult {
    let mut result = ImportResult::default();
    walk(root, DMat4::IDENTITY, &mut result);
    result
}

fn walk(node: &ArchiveNode, parent: DMat4, result: &mut ImportResult) {
    let local = DMat4::from_cols_array_2d(&node.local_transform);
    let world = parent * local;

    match &node.content {
        ArchiveContent::Group => {}
        ArchiveContent::Mesh(archive_mesh) => {
            result.meshes.push(bake_mesh(archive_mesh, world));
        }
        ArchiveContent::Camera(camera) => {
            result.cameras.push(ImportedCamera {
                transform: to_affine3a(world),
                focal_length: camera.focal_length,
                sensor_width: camera.sensor_width,
            });
        }
    }

    for child in &node.children {
        walk(child, world, result);
    }
}

fn to_affine3a(world: DMat4) -> Affine3A {
    let world_f32 = glam::Mat4::from_cols_array_2d(&world.to_cols_array_2d().map(|col| col.map(|c| c as f32)));
    Affine3A::from_mat4(world_f32)
}

fn bake_mesh(archive_mesh: &ArchiveMesh, world: DMat4) -> ImportedMesh {
    let affine = DAffine3::from_mat4(world);
    let positions: Vec<Vec3> = archive_mesh
        .positions
        .iter()
        .map(|&[x, y, z]| {
            let p = affine.transform_point3(glam::DVec3::new(x, y, z));
            Vec3::new(p.x as f32, p.y as f32, p.z as f32)
        })
        .collect();

    ImportedMesh {
        positions,
        indices: archive_mesh.indices.clone(),
        material_name: archive_mesh.material_name.clone(),
    }
}

/// Resolves an imported mesh's material name against a compiled material
/// table, assigning material 0 (a neutral default expected to always be
/// present) when the archive referenced a name with no matching descriptor
/// entry.
#[must_use]
pub fn resolve_material_id(material_name: Option<&str>, names: &[(String, u32)]) -> u32 {
    material_name
        .and_then(|name| names.iter().find(|(n, _)| n == name))
        .map_or(0, |(_, id)| *id)
}

/// A neutral gray diffuse material, used as material 0 when an archive's
/// meshes reference no material descriptor at all.
#[must_use]
pub fn default_material() -> Material {
    Material::new(ClosureNode::Lobe { lobe: Lobe::Lambert { albedo: Vec3::splat(0.75) }, weight: Vec3::ONE })
}
