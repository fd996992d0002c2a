/// Render settings constructed by the host-embedding adapter from the
/// host's render settings. A plain `Copy` struct — there is no on-disk
/// engine config file; the settings live for exactly one render call.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub samples_per_pixel: u32,
    pub paths_per_sample: u32,
    pub max_path_depth: u32,
    /// Bounce index after which Russian-roulette termination kicks in.
    pub rr_min_bounce: u32,
    /// Upper bound on the roulette survival probability.
    pub rr_q_max: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            samples_per_pixel: 64,
            paths_per_sample: 1,
            max_path_depth: 8,
            rr_min_bounce: 3,
            rr_q_max: 0.95,
        }
    }
}
