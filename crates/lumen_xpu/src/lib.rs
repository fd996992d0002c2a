//! Worker-thread orchestration: one tile-loop worker per hardware thread,
//! sharing only the tile scheduler's atomic counter and the film sink's
//! mutex. The render call is synchronous and joins every worker before
//! returning.

mod render;
mod worker;

pub use render::render;
