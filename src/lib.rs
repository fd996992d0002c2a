//! Lumen: an offline/interactive path-tracing renderer core.
//!
//! This umbrella crate aggregates the per-concern `lumen_*` crates into the
//! surface an embedding host actually depends on, re-exporting the data
//! model ([`Scene`], [`Mesh`], [`Material`], [`Light`]), the render entry
//! point, and the host-embedding [`Engine`] from `lumen_adapters`. Internal
//! crates stay path dependencies of this one rather than something a
//! downstream user needs to name directly — mirroring the way a larger
//! engine in this ecosystem ships one workspace-root crate over asking
//! callers to pull in a dozen path crates themselves.

pub use lumen_adapters::{
    ArchiveContent, ArchiveNode, CameraDescriptor, Engine, EngineConfig, NumericWarnings, Region, RenderError,
    Result, SceneDescriptor, SessionHandle,
};
pub use lumen_arena::Arena;
pub use lumen_bsdf::{Bsdf, BsdfSample, Lobe};
pub use lumen_camera::Camera;
pub use lumen_film::{BufferSink, FilmSink, OriginConvention, TileRect, TileScheduler};
pub use lumen_geometry::{GeometryError, Mesh, MeshBuilder, MeshId, NormalLayout};
pub use lumen_integrator::{trace_path, IntegratorScene, RenderSettings};
pub use lumen_lights::{AreaLight, Light, LightSample, LightTriangle};
pub use lumen_sampler::Sampler;
pub use lumen_scene::{Scene, SceneBuilder};
pub use lumen_shading::{ClosureNode, Material};

/// Renders `scene` through `camera` at `image_width` x `image_height`,
/// delivering tiles to `sink` as they complete. Thin re-export of
/// [`lumen_xpu::render`] — the umbrella crate's job is aggregation, not
/// adding behavior on top of the worker orchestration it already provides.
pub use lumen_xpu::render;

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::{Affine3A, Vec3};
    use std::sync::atomic::AtomicBool;

    #[test]
    fn a_minimal_scene_renders_without_panicking() {
        let mut builder = SceneBuilder::new();
        builder.add_material(Material::new(ClosureNode::Lobe {
            lobe: Lobe::Lambert { albedo: Vec3::splat(0.8) },
            weight: Vec3::ONE,
        }));
        builder.add_light(Light::Infinite { radiance: Vec3::splat(0.1) });

        let camera = Camera::pinhole(Affine3A::IDENTITY, 1.0, 4, 4);
        let scene = builder.build(camera).unwrap();

        let sink = BufferSink::new(4, 4, OriginConvention::TopLeft);
        let cancel = AtomicBool::new(false);
        let settings = RenderSettings { samples_per_pixel: 1, ..RenderSettings::default() };
        render(&scene, scene.camera(), &settings, 4, 4, &sink, &cancel, 0);

        let pixels = sink.snapshot();
        assert_eq!(pixels.len(), 4 * 4 * 4);
    }
}
