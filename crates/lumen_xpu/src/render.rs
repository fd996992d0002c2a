use crate::worker::run_worker;
use lumen_camera::Camera;
use lumen_film::{FilmSink, TileScheduler};
use lumen_integrator::{IntegratorScene, RenderSettings};
use std::num::NonZeroUsize;
use std::sync::atomic::AtomicBool;

/// Default tile edge length in pixels, matching the teacher engine's own
/// preference for small square work units over whole-scanline tiles.
const TILE_SIZE: u32 = 32;

/// Renders `scene` through `camera` at `image_width` x `image_height`,
/// spawning one worker per hardware thread and joining all of them before
/// returning. `cancel` is checked between tiles; setting it mid-render
/// lets the call return early once in-flight tiles finish. `frame_seed`
/// seeds every pixel's sampler, so the same scene/settings/seed reproduces
/// the same frame.
pub fn render(
    scene: &(impl IntegratorScene + Sync),
    camera: &Camera,
    settings: &RenderSettings,
    image_width: u32,
    image_height: u32,
    sink: &(dyn FilmSink + Sync),
    cancel: &AtomicBool,
    frame_seed: u64,
) {
    let scheduler = TileScheduler::new(image_width, image_height, TILE_SIZE);
    let worker_count = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);

    log::info!(
        "starting render: {image_width}x{image_height}, {} tiles, {worker_count} workers, {} spp",
        scheduler.tile_count(),
        settings.samples_per_pixel
    );

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| run_worker(scene, camera, settings, &scheduler, sink, cancel, frame_seed));
        }
    });

    log::info!("render finished");
}
