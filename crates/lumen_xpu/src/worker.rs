use lumen_arena::Arena;
use lumen_camera::Camera;
use lumen_film::{FilmSink, TileRect, TileScheduler};
use lumen_integrator::{trace_path, IntegratorScene, RenderSettings};
use lumen_math::Vec3;
use lumen_sampler::Sampler;
use std::sync::atomic::{AtomicBool, Ordering};

/// Initial chunk size for each worker's per-bounce arena. Sized for a
/// handful of lobes plus a little slack; `bumpalo` grows past this on
/// demand, so it's a sizing hint rather than a hard ceiling.
const WORKER_ARENA_BYTES: usize = 64 * 1024;

/// Runs one worker's tile loop: claim tiles from `scheduler` until it is
/// exhausted or `cancel` is set, rendering every pixel of each claimed tile
/// at `settings.samples_per_pixel` before handing it to `sink`.
///
/// Cancellation is only observed between tiles — a tile in progress always
/// finishes and is delivered, matching the cooperative-cancellation
/// contract.
#[allow(clippy::too_many_arguments)]
pub fn run_worker(
    scene: &(impl IntegratorScene + Sync),
    camera: &Camera,
    settings: &RenderSettings,
    scheduler: &TileScheduler,
    sink: &dyn FilmSink,
    cancel: &AtomicBool,
    frame_seed: u64,
) {
    let arena = Arena::with_capacity(WORKER_ARENA_BYTES);

    while !cancel.load(Ordering::Relaxed) {
        let Some(tile) = scheduler.next() else { break };
        let pixels = render_tile(scene, camera, settings, &arena, tile, frame_seed);
        sink.deliver_tile(tile, &pixels);
    }
}

fn render_tile(
    scene: &(impl IntegratorScene + Sync),
    camera: &Camera,
    settings: &RenderSettings,
    arena: &Arena,
    tile: TileRect,
    frame_seed: u64,
) -> Vec<f32> {
    let mut pixels = vec![0.0f32; tile.pixel_count() * 4];

    for row in 0..tile.height {
        for col in 0..tile.width {
            let px = tile.x + col;
            let py = tile.y + row;
            let color = render_pixel(scene, camera, settings, arena, px, py, frame_seed);

            let idx = ((row * tile.width + col) * 4) as usize;
            pixels[idx] = color.x;
            pixels[idx + 1] = color.y;
            pixels[idx + 2] = color.z;
            pixels[idx + 3] = 1.0;
        }
    }

    pixels
}

fn render_pixel(
    scene: &(impl IntegratorScene + Sync),
    camera: &Camera,
    settings: &RenderSettings,
    arena: &Arena,
    pixel_x: u32,
    pixel_y: u32,
    frame_seed: u64,
) -> Vec3 {
    let mut sampler = Sampler::for_pixel(pixel_x, pixel_y, frame_seed, settings.samples_per_pixel);
    let mut accum = Vec3::ZERO;
    let total_paths = settings.samples_per_pixel.max(1) * settings.paths_per_sample.max(1);

    for sample in 0..settings.samples_per_pixel {
        let jitter = sampler.pixel_jitter(sample);
        let lens_uv = sampler.next_2d();
        let (origin, direction) = camera.generate_ray(pixel_x, pixel_y, jitter.x, jitter.y, lens_uv);

        for _ in 0..settings.paths_per_sample {
            accum += trace_path(scene, arena, &mut sampler, settings, origin, direction);
            arena.reset();
        }
    }

    accum / total_paths as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_accel::{Bvh, TriangleSource};
    use lumen_geometry::{Mesh, MeshId};
    use lumen_lights::Light;
    use lumen_math::Affine3A;
    use lumen_shading::Material;

    struct EmptyScene {
        bvh: Bvh,
    }

    impl TriangleSource for EmptyScene {
        fn triangle_vertices(&self, _mesh: MeshId, _face: u32) -> (Vec3, Vec3, Vec3) {
            unreachable!("no triangles in an empty scene")
        }
    }

    impl IntegratorScene for EmptyScene {
        fn bvh(&self) -> &Bvh {
            &self.bvh
        }
        fn mesh(&self, _id: MeshId) -> Option<&Mesh> {
            None
        }
        fn material_for(&self, _mesh: MeshId, _face_set: u32) -> Option<u32> {
            None
        }
        fn material(&self, _id: u32) -> Option<&Material> {
            None
        }
        fn lights(&self) -> &[Light] {
            &[]
        }
        fn environment(&self) -> Option<&Light> {
            None
        }
    }

    #[test]
    fn rendering_an_empty_scene_yields_black_pixels() {
        struct NoTriangles;
        impl TriangleSource for NoTriangles {
            fn triangle_vertices(&self, _mesh: MeshId, _face: u32) -> (Vec3, Vec3, Vec3) {
                unreachable!()
            }
        }
        let scene = EmptyScene { bvh: lumen_accel::build_bvh(Vec::new(), &NoTriangles) };
        let camera = Camera::pinhole(Affine3A::IDENTITY, 1.0, 4, 4);
        let settings = RenderSettings { samples_per_pixel: 2, ..RenderSettings::default() };
        let arena = Arena::with_capacity(WORKER_ARENA_BYTES);
        let color = render_pixel(&scene, &camera, &settings, &arena, 2, 2, 0);
        assert_eq!(color, Vec3::ZERO);
    }
}
