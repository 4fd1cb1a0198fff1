// crates/visoai-media/src/helpers/mod.rs
//
// Internal helpers for visoai-media. Not re-exported from lib.rs.

pub mod paths;
pub mod progress;
pub mod seek;
