//! JPEG encoding and output file naming.

pub mod files;
pub mod jpeg;
