//! The tile scheduler and film sink: workers claim tiles from an atomic
//! counter and hand finished pixels off to a mutex-serialized sink.

mod scheduler;
mod sink;

pub use scheduler::{TileRect, TileScheduler};
pub use sink::{BufferSink, FilmSink, OriginConvention};
