use crate::closure::{ClosureNode, Material};
use crate::globals::ShadingGlobals;
use lumen_arena::{Arena, ArenaError};
use lumen_bsdf::{local_to_world, shading_frame, world_to_local, Bsdf};
use lumen_math::Vec3;

/// Result of evaluating a material at a shading point: a BSDF allocated
/// from the caller's per-bounce arena (never to be retained past the next
/// reset, per the arena's contract), the accumulated self-emission, and the
/// orthonormal shading frame the BSDF's directions are expressed in.
pub struct ShadeResult<'a> {
    pub bsdf: &'a Bsdf,
    pub emission: Vec3,
    pub is_emitter: bool,
    pub frame: (Vec3, Vec3, Vec3),
}

/// Walks a material's closure tree, accumulating lobe contributions into a
/// newly arena-allocated [`Bsdf`] and emission closures into a running sum,
/// then hands both back alongside the shading frame built from
/// `globals.shading_normal`.
///
/// # Errors
/// Returns [`ArenaError::OutOfMemory`] if the arena has no room left for
/// the [`Bsdf`] (a `ResourceError` at the caller's level).
pub fn shade<'a>(
    material: &Material,
    globals: &ShadingGlobals,
    arena: &'a Arena,
) -> Result<ShadeResult<'a>, ArenaError> {
    let frame = shading_frame(globals.shading_normal);
    let mut bsdf = Bsdf::new();
    let mut emission = Vec3::ZERO;
    walk(material.closure(), Vec3::ONE, &mut bsdf, &mut emission);

    let bsdf_ref = arena.alloc(bsdf)?;
    Ok(ShadeResult { bsdf: bsdf_ref, emission, is_emitter: material.is_emitter(), frame })
}

fn walk(node: &ClosureNode, weight: Vec3, bsdf: &mut Bsdf, emission: &mut Vec3) {
    match node {
        ClosureNode::Lobe { lobe, weight: lobe_weight } => {
            bsdf.push(*lobe, weight * *lobe_weight);
        }
        ClosureNode::Emission { radiance } => {
            *emission += weight * *radiance;
        }
        ClosureNode::Add(children) => {
            for child in children {
                walk(child, weight, bsdf, emission);
            }
        }
        ClosureNode::Scale { weight: scale, node } => {
            walk(node, weight * *scale, bsdf, emission);
        }
    }
}

/// Transforms a world-space direction into the local shading frame
/// `(tangent, bitangent, normal)`.
#[must_use]
pub fn to_local(v: Vec3, frame: (Vec3, Vec3, Vec3)) -> Vec3 {
    world_to_local(v, frame.0, frame.1, frame.2)
}

/// Transforms a local shading-frame direction back into world space.
#[must_use]
pub fn to_world(v: Vec3, frame: (Vec3, Vec3, Vec3)) -> Vec3 {
    local_to_world(v, frame.0, frame.1, frame.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::Material;
    use lumen_bsdf::Lobe;
    use lumen_math::Vec2;

    fn globals() -> ShadingGlobals {
        ShadingGlobals::new(Vec3::ZERO, Vec3::Z, Vec3::Z, Vec3::Z, Vec2::ZERO)
    }

    #[test]
    fn lambert_only_material_has_no_emission() {
        let material = Material::new(ClosureNode::Lobe {
            lobe: Lobe::Lambert { albedo: Vec3::splat(0.8) },
            weight: Vec3::ONE,
        });
        let arena = Arena::with_capacity(4096);
        let result = shade(&material, &globals(), &arena).unwrap();
        assert_eq!(result.emission, Vec3::ZERO);
        assert!(!result.is_emitter);
        assert_eq!(result.bsdf.lobe_count(), 1);
    }

    #[test]
    fn scaled_emission_accumulates_with_its_weight() {
        let material = Material::new(ClosureNode::Scale {
            weight: Vec3::splat(2.0),
            node: Box::new(ClosureNode::Emission { radiance: Vec3::splat(3.0) }),
        });
        let arena = Arena::with_capacity(4096);
        let result = shade(&material, &globals(), &arena).unwrap();
        assert_eq!(result.emission, Vec3::splat(6.0));
        assert!(result.is_emitter);
        assert_eq!(result.bsdf.lobe_count(), 0);
    }

    #[test]
    fn mixed_closure_separates_lobes_from_emission() {
        let material = Material::new(ClosureNode::Add(vec![
            ClosureNode::Lobe { lobe: Lobe::Lambert { albedo: Vec3::ONE }, weight: Vec3::ONE },
            ClosureNode::Emission { radiance: Vec3::splat(1.5) },
        ]));
        let arena = Arena::with_capacity(4096);
        let result = shade(&material, &globals(), &arena).unwrap();
        assert_eq!(result.bsdf.lobe_count(), 1);
        assert_eq!(result.emission, Vec3::splat(1.5));
    }

    #[test]
    fn frame_round_trips_through_local_and_world() {
        let frame = shading_frame(Vec3::new(0.3, 0.5, 0.8).normalize());
        let v = Vec3::new(0.1, 0.2, 0.9).normalize();
        let local = to_local(v, frame);
        let back = to_world(local, frame);
        assert!((back - v).length() < 1e-4);
    }
}
