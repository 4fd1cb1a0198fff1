// crates/visoai-core/src/lib.rs
//
// Pure editor state for the dual-track timeline: tracks, trim model, playback
// clock, render job, preview handles. No egui, no ffmpeg, no threads.

pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod helpers;
pub mod media_types;
pub mod playback;
pub mod preview;
pub mod render_job;
pub mod track;
pub mod trim;
