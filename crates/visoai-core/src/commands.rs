// crates/visoai-core/src/commands.rs
//
// Every user action in the editor is expressed as an EditorCommand.
// Panels emit these; app.rs processes them after the UI pass.

use std::path::PathBuf;

use crate::config::VideoCodecMode;
use crate::track::TrackKind;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    // ── Playback ─────────────────────────────────────────────────────────────
    Play,
    Stop,
    TogglePlayback,
    SetVolume(f32),

    // ── Media loading ────────────────────────────────────────────────────────
    /// Open a file dialog filtered for the given track kind.
    PickFile(TrackKind),
    LoadFile { kind: TrackKind, path: PathBuf },

    // ── Timeline ─────────────────────────────────────────────────────────────
    /// Proposed thumb positions from a range slider, in seconds.
    SetTrim { kind: TrackKind, start: f64, end: f64 },

    // ── Stored-video library ─────────────────────────────────────────────────
    RefreshLibrary,
    LoadStoredVideo(i64),
    DeleteStoredVideo(i64),

    // ── Export ───────────────────────────────────────────────────────────────
    Render,
    /// Open a save dialog and copy the finished render to the chosen path.
    SaveOutput,
    DismissRenderError,
    SetVideoCodec(VideoCodecMode),

    // ── View ─────────────────────────────────────────────────────────────────
    DismissNotice(usize),
}
