use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// One error enum covering the renderer's whole error taxonomy, from scene
/// setup down to on-disk descriptor parsing. Mirrors the way the teacher
/// engine collects its own setup/runtime/parse failures into one
/// `#[derive(Error)]` enum with `#[from]` conversions rather than a
/// per-crate error type per concern.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Bad host configuration: an unreadable resource path, a malformed
    /// render-settings value. Aborts setup with a message to the host.
    #[error("configuration error: {0}")]
    Config(String),

    /// Out-of-memory from an arena, or failure to create a GPU/host
    /// resource the render depends on. Aborts setup.
    #[error("resource error: {0}")]
    Resource(String),

    /// A mesh failed to freeze or referenced an undefined material.
    /// Downgrades to a warning at the scene builder; the offending mesh is
    /// dropped rather than aborting the whole render.
    #[error(transparent)]
    Geometry(#[from] lumen_geometry::GeometryError),

    /// The render was cancelled by the host; observed only at tile
    /// boundaries, never mid-tile.
    #[error("render cancelled")]
    Cancelled,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene descriptor parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No session exists for the given handle (double-free, or a handle
    /// from a different engine instance).
    #[error("unknown session handle")]
    UnknownHandle,
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Counts non-fatal numeric degeneracies (NaN/Inf radiance clamped to
/// zero, a zero-pdf BSDF sample discarded) across a render. Not an error
/// return — a render that never checks this counter still completes
/// correctly — but surfaced so a host can flag a persistently noisy scene.
/// The first occurrence in a given tile is logged; the rest are silently
/// counted, so a bad scene doesn't flood the host's log.
#[derive(Debug, Default)]
pub struct NumericWarnings {
    count: AtomicU64,
    logged_this_tile: AtomicU64,
}

impl NumericWarnings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, context: &str) {
        let previous = self.count.fetch_add(1, Ordering::Relaxed);
        if previous == 0 || self.logged_this_tile.swap(1, Ordering::Relaxed) == 0 {
            log::warn!("numeric warning: {context}");
        }
    }

    pub fn begin_tile(&self) {
        self.logged_this_tile.store(0, Ordering::Relaxed);
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_warnings_count_every_occurrence() {
        let warnings = NumericWarnings::new();
        warnings.record("nan radiance");
        warnings.record("nan radiance");
        warnings.record("nan radiance");
        assert_eq!(warnings.total(), 3);
    }

    #[test]
    fn begin_tile_resets_the_per_tile_log_gate() {
        let warnings = NumericWarnings::new();
        warnings.record("a");
        warnings.begin_tile();
        warnings.record("b");
        assert_eq!(warnings.total(), 2);
    }
}
