//! Running an export end to end.

pub mod compose;
pub mod job;
