//! Pixel sources and decoding.

pub mod decode;
pub mod source;
