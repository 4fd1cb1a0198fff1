// crates/visoai-core/src/helpers/mod.rs
pub mod scale;
pub mod time;
