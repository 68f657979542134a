//! Pixel work: painting segments, compositing the watermark.

pub mod blur;
pub mod canvas;
pub mod composite;
pub mod watermark;
