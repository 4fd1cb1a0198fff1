// crates/visoai-core/src/media_types.rs
//
// Types that flow across the channel between visoai-media and visoai-ui.
// No egui, no ffmpeg; just plain data.

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::{MediaLoadError, RenderFailure};
use crate::track::LoadedMedia;

/// Results sent from the MediaWorker background threads to the UI.
#[derive(Debug)]
pub enum MediaResult {
    TrackLoaded(LoadedMedia),
    /// A stored video split into its video-only copy and its original.
    StoredVideoLoaded { video: LoadedMedia, audio: LoadedMedia },
    LoadFailed(MediaLoadError),
    RenderProgress { job_id: Uuid, fraction: f64 },
    RenderDone     { job_id: Uuid, path: PathBuf },
    RenderFailed   { job_id: Uuid, failure: RenderFailure },
    /// Native size of the video track's preview stream.
    VideoSize      { width: u32, height: u32 },
}

/// A decoded frame from the preview decode thread.
pub struct PlaybackFrame {
    /// Session the frame was decoded for; frames from an older session are dropped.
    pub session:   u64,
    /// Seconds into the source.
    pub timestamp: f64,
    pub width:     u32,
    pub height:    u32,
    pub data:      Vec<u8>, // RGBA
}
