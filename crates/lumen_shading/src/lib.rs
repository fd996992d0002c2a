//! Material closure trees and the two-phase shading dispatch described in
//! the component design: bucket the active ray set by material, then
//! evaluate each non-empty bucket's material once against its shading
//! globals, walking its closure tree into an arena-allocated [`lumen_bsdf::Bsdf`].

mod bucket;
mod closure;
mod evaluate;
mod globals;

pub use bucket::{bucket_by_material, HitBuckets};
pub use closure::{ClosureNode, Material};
pub use evaluate::{shade, to_local, to_world, ShadeResult};
pub use globals::ShadingGlobals;
