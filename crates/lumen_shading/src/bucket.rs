use lumen_geometry::MeshId;
use rustc_hash::FxHashMap;

/// Result of bucketing an active ray set by material: one group of ray
/// indices per material ID that was actually hit, plus a separate list of
/// rays that missed all geometry (to be evaluated against an infinite
/// light, if one exists, rather than any material).
#[derive(Debug, Default)]
pub struct HitBuckets {
    pub by_material: Vec<(u32, Vec<u32>)>,
    pub misses: Vec<u32>,
}

/// Buckets `active` ray indices by the material of the geometry they hit.
///
/// `is_hit`, `mesh`, `face_set` are indexed by ray index (as produced by
/// the traversal stream); `material_of` resolves a `(mesh, face_set)` pair
/// to a material ID, returning `None` if the face-set has no material
/// bound (treated as a miss, same as a ray that hit nothing).
#[must_use]
pub fn bucket_by_material(
    active: &[u32],
    is_hit: impl Fn(u32) -> bool,
    mesh_of: impl Fn(u32) -> MeshId,
    face_set_of: impl Fn(u32) -> u32,
    material_of: impl Fn(MeshId, u32) -> Option<u32>,
) -> HitBuckets {
    let mut groups: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
    let mut misses = Vec::new();

    for &ray in active {
        if !is_hit(ray) {
            misses.push(ray);
            continue;
        }
        let mesh = mesh_of(ray);
        let face_set = face_set_of(ray);
        match material_of(mesh, face_set) {
            Some(material_id) => groups.entry(material_id).or_default().push(ray),
            None => misses.push(ray),
        }
    }

    let mut by_material: Vec<(u32, Vec<u32>)> = groups.into_iter().collect();
    by_material.sort_unstable_by_key(|(id, _)| *id);
    HitBuckets { by_material, misses }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rays_group_by_their_resolved_material_id() {
        let active = vec![0, 1, 2, 3];
        let is_hit = |r: u32| r != 3;
        let mesh_of = |_: u32| MeshId(0);
        let face_set_of = |r: u32| if r == 0 { 0 } else { 1 };
        let material_of = |_: MeshId, fs: u32| Some(fs + 10);

        let buckets = bucket_by_material(&active, is_hit, mesh_of, face_set_of, material_of);
        assert_eq!(buckets.misses, vec![3]);
        assert_eq!(buckets.by_material, vec![(10, vec![0]), (11, vec![1, 2])]);
    }

    #[test]
    fn undefined_material_is_treated_as_a_miss() {
        let active = vec![0];
        let buckets = bucket_by_material(
            &active,
            |_| true,
            |_| MeshId(0),
            |_| 5,
            |_, _| None,
        );
        assert!(buckets.by_material.is_empty());
        assert_eq!(buckets.misses, vec![0]);
    }
}
