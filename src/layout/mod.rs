//! Metadata-only planning: crop windows, scaled heights, gap bands, risk tiers and segments.
//!
//! Nothing in here touches pixels, so the whole plan can be computed before an export starts.

pub mod crop;
pub mod gaps;
pub mod geometry;
pub mod packer;
pub mod risk;
