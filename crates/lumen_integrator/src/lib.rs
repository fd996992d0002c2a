//! Next-event-estimation path tracing integrator.
//!
//! [`trace_path`] runs the full per-bounce state machine described in the
//! component design — traverse, shade, direct-light sample, BSDF
//! continuation, Russian roulette — for a single primary ray. Workers
//! (`lumen_xpu`) call it once per sample per pixel and accumulate the
//! result into the film.

mod path;
mod scene;
mod settings;

pub use path::trace_path;
pub use scene::IntegratorScene;
pub use settings::RenderSettings;
