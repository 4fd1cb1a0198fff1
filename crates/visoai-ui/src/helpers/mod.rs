// crates/visoai-ui/src/helpers/mod.rs

pub mod format;
pub mod log;
pub mod range_slider;
