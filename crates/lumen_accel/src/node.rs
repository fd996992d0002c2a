use lumen_math::aabb::AabbN;
use lumen_math::LANES;

/// MBVH fan-out. Matches the SIMD lane width so a single ray tests every
/// child of a node in one N-wide box intersection.
pub const WIDTH: usize = LANES;

/// What a child slot of an [`MbvhNode`] points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    /// Slot unused; padding when a node has fewer than [`WIDTH`] children.
    /// Its bounds lane is left empty (`+inf/-inf`) so it never matches.
    Empty,
    /// Index into the flat node array.
    Internal { node: u32 },
    /// `first_record` indexes into the flat packed-triangle-record array;
    /// `record_count` is the number of `N`-wide records owned by this leaf
    /// (not a triangle count — each record packs up to `WIDTH` triangles).
    Leaf { first_record: u32, record_count: u32 },
}

impl ChildSlot {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, ChildSlot::Leaf { .. })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, ChildSlot::Empty)
    }
}

/// One MBVH node: up to [`WIDTH`] children, their bounds stored SoA so a
/// ray can be tested against all of them in a single N-wide intersection.
#[derive(Debug, Clone)]
pub struct MbvhNode {
    pub bounds: AabbN,
    pub children: [ChildSlot; WIDTH],
    pub child_count: u8,
}

impl MbvhNode {
    #[must_use]
    pub fn empty() -> Self {
        MbvhNode {
            bounds: AabbN::empty(),
            children: [ChildSlot::Empty; WIDTH],
            child_count: 0,
        }
    }
}

impl Default for MbvhNode {
    fn default() -> Self {
        Self::empty()
    }
}
