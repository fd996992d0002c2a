use crate::scene::IntegratorScene;
use crate::settings::RenderSettings;
use lumen_accel::{trace, RayStream};
use lumen_arena::Arena;
use lumen_math::Vec3;
use lumen_sampler::Sampler;
use lumen_shading::ShadingGlobals;

/// Offset applied along the geometric normal when spawning shadow and
/// continuation rays, avoiding self-intersection with the surface the ray
/// just left.
const SHADOW_EPSILON: f32 = 1e-4;

/// Traces one path from `origin` in `direction`, accumulating radiance with
/// next-event estimation at every non-specular bounce and Russian-roulette
/// termination after `settings.rr_min_bounce` bounces.
///
/// `arena` is reset by the caller between samples (or scoped per bounce
/// here); nothing returned from this function borrows from it.
#[must_use]
pub fn trace_path(
    scene: &impl IntegratorScene,
    arena: &Arena,
    sampler: &mut Sampler,
    settings: &RenderSettings,
    origin: Vec3,
    direction: Vec3,
) -> Vec3 {
    let mut stream = RayStream::with_capacity(1);
    let mut ray_origin = origin;
    let mut ray_direction = direction;
    let mut beta = Vec3::ONE;
    let mut l = Vec3::ZERO;
    let mut specular_bounce = true;

    for bounce in 0..settings.max_path_depth {
        stream.set_ray(0, ray_origin, ray_direction, f32::INFINITY);
        trace(&mut stream, &[0], scene.bvh());

        if !stream.is_hit(0) {
            if let Some(env) = scene.environment() {
                if let Some(radiance) = env.environment_radiance() {
                    l += beta * radiance;
                }
            }
            break;
        }

        let (mesh_id, face_set, face, bary_u, bary_v, _distance) = stream.hit_record(0);
        let Some(mesh) = scene.mesh(mesh_id) else { break };
        let (position, shading_normal, uv) = mesh.shading_parameters(face, bary_u, bary_v);
        let geometric_normal = mesh.geometric_normal(face);
        let wi = -ray_direction;

        let Some(material_id) = scene.material_for(mesh_id, face_set) else { break };
        let Some(material) = scene.material(material_id) else { break };

        let globals = ShadingGlobals::new(position, wi, geometric_normal, shading_normal, uv);
        let _scope = arena.scope();
        let Ok(shaded) = lumen_shading::shade(material, &globals, arena) else { break };

        if shaded.is_emitter && (bounce == 0 || specular_bounce) {
            l += beta * shaded.emission;
        }

        let wi_local = lumen_shading::to_local(wi, shaded.frame);

        if !shaded.bsdf.is_purely_specular() && !scene.lights().is_empty() {
            if let Some(contribution) =
                sample_direct_light(scene, sampler, shaded.bsdf, shaded.frame, position, shading_normal, geometric_normal, wi_local)
            {
                l += beta * contribution;
            }
        }

        let select_u = sampler.next_1d();
        let (du, dv) = sampler.next_2d();
        let Some(bsdf_sample) = shaded.bsdf.sample(wi_local, (select_u, du, dv)) else { break };
        if !(bsdf_sample.pdf > 0.0) || !bsdf_sample.pdf.is_finite() {
            break;
        }

        let wo_world = lumen_shading::to_world(bsdf_sample.wo, shaded.frame);
        let cos_wo = shading_normal.dot(wo_world).abs();
        let throughput_scale = bsdf_sample.value * (cos_wo / bsdf_sample.pdf);
        if !throughput_scale.is_finite() {
            break;
        }
        beta *= throughput_scale;

        if bounce >= settings.rr_min_bounce {
            let q = beta.max_element().min(settings.rr_q_max);
            if q <= 0.0 || sampler.next_1d() > q {
                break;
            }
            beta /= q;
        }

        let sign = geometric_normal.dot(wo_world).signum();
        ray_origin = position + geometric_normal * (SHADOW_EPSILON * sign);
        ray_direction = wo_world;
        specular_bounce = bsdf_sample.is_delta;
    }

    if l.is_finite() {
        l
    } else {
        Vec3::ZERO
    }
}

#[allow(clippy::too_many_arguments)]
fn sample_direct_light(
    scene: &impl IntegratorScene,
    sampler: &mut Sampler,
    bsdf: &lumen_bsdf::Bsdf,
    frame: (Vec3, Vec3, Vec3),
    position: Vec3,
    shading_normal: Vec3,
    geometric_normal: Vec3,
    wi_local: Vec3,
) -> Option<Vec3> {
    let lights = scene.lights();
    let light_index = sampler.pick_light(lights.len());
    let light = &lights[light_index];
    let (u, v) = sampler.next_2d();
    let light_sample = light.sample(position, u, v)?;
    if light_sample.pdf <= 0.0 || light_sample.radiance == Vec3::ZERO {
        return None;
    }

    let wo_local = lumen_shading::to_local(light_sample.direction, frame);
    let f = bsdf.f(wi_local, wo_local);
    if f == Vec3::ZERO {
        return None;
    }

    let cos_term = shading_normal.dot(light_sample.direction).abs();
    if cos_term <= 0.0 {
        return None;
    }

    let sign = geometric_normal.dot(light_sample.direction).signum();
    let shadow_origin = position + geometric_normal * (SHADOW_EPSILON * sign);
    let shadow_max = if light_sample.distance.is_finite() {
        (light_sample.distance - SHADOW_EPSILON).max(0.0)
    } else {
        f32::INFINITY
    };

    let mut shadow_stream = RayStream::with_capacity(1);
    shadow_stream.set_ray(0, shadow_origin, light_sample.direction, shadow_max);
    trace(&mut shadow_stream, &[0], scene.bvh());
    if shadow_stream.is_hit(0) {
        return None;
    }

    let n_lights = lights.len() as f32;
    Some(f * cos_term * light_sample.radiance / (light_sample.pdf * n_lights))
}
