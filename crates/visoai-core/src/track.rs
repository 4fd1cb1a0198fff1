// crates/visoai-core/src/track.rs
//
// Per-track records. The editor has exactly two slots, addressed by
// TrackKind through `Tracks::get` / `Tracks::get_mut`.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::preview::PreviewUrl;
use crate::trim::TrimRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub const ALL: [TrackKind; 2] = [TrackKind::Video, TrackKind::Audio];

    pub fn label(self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the media loader hands back once a source has been probed.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedMedia {
    pub kind:     TrackKind,
    pub path:     PathBuf,
    pub duration: f64,
    /// Display name: file name, or the prompt of a stored video.
    pub label:    String,
    /// True when `path` is a session temp file that must be deleted on release.
    /// User-picked files are never owned.
    pub owned:    bool,
}

/// A loaded track slot.
#[derive(Debug)]
pub struct MediaTrack {
    pub source:         PathBuf,
    pub preview:        PreviewUrl,
    pub total_duration: f64,
    pub trim:           TrimRange,
    pub label:          String,
}

impl MediaTrack {
    pub fn trim_start(&self) -> f64 { self.trim.start() }
    pub fn trim_end(&self)   -> f64 { self.trim.end() }
}

/// The two track slots. Either may be empty until the user loads a source.
#[derive(Debug, Default)]
pub struct Tracks {
    pub video: Option<MediaTrack>,
    pub audio: Option<MediaTrack>,
}

impl Tracks {
    pub fn get(&self, kind: TrackKind) -> Option<&MediaTrack> {
        match kind {
            TrackKind::Video => self.video.as_ref(),
            TrackKind::Audio => self.audio.as_ref(),
        }
    }

    pub fn get_mut(&mut self, kind: TrackKind) -> Option<&mut MediaTrack> {
        match kind {
            TrackKind::Video => self.video.as_mut(),
            TrackKind::Audio => self.audio.as_mut(),
        }
    }

    /// Replace a slot, returning the previous occupant so the caller can
    /// release its preview URL.
    pub fn replace(&mut self, kind: TrackKind, track: MediaTrack) -> Option<MediaTrack> {
        let slot = match kind {
            TrackKind::Video => &mut self.video,
            TrackKind::Audio => &mut self.audio,
        };
        slot.replace(track)
    }

    pub fn take(&mut self, kind: TrackKind) -> Option<MediaTrack> {
        match kind {
            TrackKind::Video => self.video.take(),
            TrackKind::Audio => self.audio.take(),
        }
    }

    /// Length of the longer loaded track; the shared axis for the playhead.
    pub fn longest_duration(&self) -> f64 {
        TrackKind::ALL.iter()
            .filter_map(|k| self.get(*k))
            .map(|t| t.total_duration)
            .fold(0.0_f64, f64::max)
    }
}
