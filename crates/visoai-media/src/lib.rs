// crates/visoai-media/src/lib.rs
//
// No egui dependency; communicates with visoai-ui via channels only.
//
// To add a new media capability:
//   1. Create a new module file here
//   2. Add `pub mod mymodule;` below
//   3. Call it from worker.rs (a new MediaWorker method + MediaResult variant)

pub mod cli;
pub mod decode;
pub mod loader;
pub mod probe;
pub mod render;
pub mod worker;

mod helpers;

// Re-export the main public API so visoai-ui imports are simple.
pub use cli::FfmpegCli;
pub use worker::MediaWorker;
pub use visoai_core::media_types::{MediaResult, PlaybackFrame};
