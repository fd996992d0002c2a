use lumen_bsdf::Lobe;
use lumen_math::Vec3;

/// A compiled material's shader network: a sum-of-scaled-products tree of
/// BSDF lobes and emission, mirroring the closure trees a shading runtime
/// would hand back after evaluating a shader graph at a hit point.
#[derive(Debug, Clone)]
pub enum ClosureNode {
    /// A single weighted lobe contribution.
    Lobe { lobe: Lobe, weight: Vec3 },
    /// Self-emitted radiance, independent of any lobe.
    Emission { radiance: Vec3 },
    /// Sum of several sub-closures (e.g. a diffuse + specular layered
    /// material).
    Add(Vec<ClosureNode>),
    /// A sub-closure uniformly scaled, e.g. by a fresnel-blend or mix
    /// factor baked in at compile time.
    Scale { weight: Vec3, node: Box<ClosureNode> },
}

impl ClosureNode {
    /// Whether this closure (or any sub-closure) emits radiance.
    /// Precomputed once per material at compile time; cheap enough that we
    /// don't cache it on the node itself, leaving the tree a plain value
    /// type.
    #[must_use]
    pub fn emits(&self) -> bool {
        match self {
            ClosureNode::Emission { .. } => true,
            ClosureNode::Lobe { .. } => false,
            ClosureNode::Add(nodes) => nodes.iter().any(ClosureNode::emits),
            ClosureNode::Scale { node, .. } => node.emits(),
        }
    }
}

/// A compiled material: its closure tree plus the `is_emitter` flag recorded
/// at compile time so the integrator can decide whether to add emission
/// without re-walking the tree on the hot path.
#[derive(Debug, Clone)]
pub struct Material {
    closure: ClosureNode,
    is_emitter: bool,
}

impl Material {
    #[must_use]
    pub fn new(closure: ClosureNode) -> Self {
        let is_emitter = closure.emits();
        Self { closure, is_emitter }
    }

    #[must_use]
    pub fn closure(&self) -> &ClosureNode {
        &self.closure
    }

    #[must_use]
    pub fn is_emitter(&self) -> bool {
        self.is_emitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_lobe_material_is_not_an_emitter() {
        let m = Material::new(ClosureNode::Lobe {
            lobe: Lobe::Lambert { albedo: Vec3::splat(0.5) },
            weight: Vec3::ONE,
        });
        assert!(!m.is_emitter());
    }

    #[test]
    fn emission_nested_under_add_and_scale_is_detected() {
        let m = Material::new(ClosureNode::Add(vec![
            ClosureNode::Lobe { lobe: Lobe::Lambert { albedo: Vec3::ONE }, weight: Vec3::ONE },
            ClosureNode::Scale {
                weight: Vec3::splat(2.0),
                node: Box::new(ClosureNode::Emission { radiance: Vec3::ONE }),
            },
        ]));
        assert!(m.is_emitter());
    }
}
