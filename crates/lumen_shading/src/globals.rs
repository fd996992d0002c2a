use lumen_math::{Vec2, Vec3};

/// Per-hit shading inputs populated before a material is evaluated:
/// position, the direction back toward the previous path vertex, the
/// geometric and (possibly bump/interpolated) shading normal, and the
/// surface's `u/v` parameterization.
#[derive(Debug, Clone, Copy)]
pub struct ShadingGlobals {
    pub position: Vec3,
    pub wi: Vec3,
    pub geometric_normal: Vec3,
    pub shading_normal: Vec3,
    pub uv: Vec2,
}

impl ShadingGlobals {
    #[must_use]
    pub fn new(position: Vec3, wi: Vec3, geometric_normal: Vec3, shading_normal: Vec3, uv: Vec2) -> Self {
        Self { position, wi, geometric_normal, shading_normal, uv }
    }
}
