use crate::scheduler::TileRect;
use parking_lot::Mutex;

/// Whether a [`FilmSink`]'s backing storage is addressed with `(0, 0)` at
/// the top-left (the engine's own convention, matching [`TileRect`]) or at
/// the bottom-left (e.g. the host compositor's convention). The sink
/// performs the row flip at handoff time rather than asking the rest of
/// the renderer to reason about two coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginConvention {
    TopLeft,
    BottomLeft,
}

/// Accepts finished tiles from workers under a single mutex and forwards
/// them to an external consumer. Workers call [`FilmSink::deliver_tile`]
/// once per completed tile; the critical section is just the copy into the
/// backing buffer, kept short since it's the only blocking operation on
/// the render's hot path.
pub trait FilmSink: Send + Sync {
    /// `pixels` is an RGBA float32 buffer, row-major, `tile.width *
    /// tile.height * 4` entries, in the engine's top-left-origin tile
    /// coordinates.
    fn deliver_tile(&self, tile: TileRect, pixels: &[f32]);
}

/// Reference [`FilmSink`] that accumulates delivered tiles into one
/// in-memory RGBA buffer, converting row order if the consumer addresses
/// the image bottom-left-up.
pub struct BufferSink {
    width: u32,
    height: u32,
    origin: OriginConvention,
    buffer: Mutex<Vec<f32>>,
}

impl BufferSink {
    #[must_use]
    pub fn new(width: u32, height: u32, origin: OriginConvention) -> Self {
        BufferSink {
            width,
            height,
            origin,
            buffer: Mutex::new(vec![0.0; width as usize * height as usize * 4]),
        }
    }

    /// Copies out the current buffer contents (RGBA float32, row-major in
    /// this sink's own origin convention).
    #[must_use]
    pub fn snapshot(&self) -> Vec<f32> {
        self.buffer.lock().clone()
    }
}

impl FilmSink for BufferSink {
    fn deliver_tile(&self, tile: TileRect, pixels: &[f32]) {
        debug_assert_eq!(pixels.len(), tile.pixel_count() * 4);
        let mut buffer = self.buffer.lock();
        for row in 0..tile.height {
            let dest_row = match self.origin {
                OriginConvention::TopLeft => tile.y + row,
                OriginConvention::BottomLeft => self.height - 1 - (tile.y + row),
            };
            let src_start = (row * tile.width * 4) as usize;
            let src = &pixels[src_start..src_start + (tile.width * 4) as usize];
            let dest_start = (dest_row * self.width + tile.x) as usize * 4;
            buffer[dest_start..dest_start + src.len()].copy_from_slice(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_left_sink_places_tile_at_its_own_row() {
        let sink = BufferSink::new(4, 2, OriginConvention::TopLeft);
        let tile = TileRect { x: 0, y: 1, width: 4, height: 1 };
        sink.deliver_tile(tile, &[1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
        let buf = sink.snapshot();
        // row 1 (y=1) occupies the second 16-float row in a 4-wide image.
        assert_eq!(buf[16], 1.0);
        assert_eq!(buf[0], 0.0);
    }

    #[test]
    fn bottom_left_sink_inverts_the_row() {
        let sink = BufferSink::new(4, 2, OriginConvention::BottomLeft);
        let tile = TileRect { x: 0, y: 0, width: 4, height: 1 };
        sink.deliver_tile(tile, &[1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
        let buf = sink.snapshot();
        // top-left row (y=0) should land in the last buffer row once inverted.
        assert_eq!(buf[16], 1.0);
        assert_eq!(buf[0], 0.0);
    }
}
