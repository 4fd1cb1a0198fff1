// crates/visoai-core/src/error.rs
//
// Typed errors for the editor core. Every variant maps to a user-visible
// notice; nothing here is fatal to the editor session.

use thiserror::Error;

use crate::track::TrackKind;

/// A source could not be decoded or yielded no usable metadata.
/// The editor keeps its previous state for that track slot.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not load {kind} source: {cause}")]
pub struct MediaLoadError {
    pub kind:  TrackKind,
    pub cause: String,
}

impl MediaLoadError {
    pub fn new(kind: TrackKind, cause: impl Into<String>) -> Self {
        Self { kind, cause: cause.into() }
    }
}

/// A media element refused to start (no output device, decoder failure).
/// Playback continues optimistically; the playhead still advances.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} preview could not start: {reason}")]
pub struct PlaybackDeviceError {
    pub kind:   TrackKind,
    pub reason: String,
}

/// One step of the render pipeline failed. `message` is the encoder's own
/// diagnostic where one was available.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("render failed during {step}: {message}")]
pub struct RenderFailure {
    pub step:    String,
    pub message: String,
}

/// Raised inside the trim model when a proposal breaks an invariant.
/// Always resolved by clamping, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimelineConstraintViolation {
    #[error("non-finite trim value")]
    NonFinite,
    #[error("trim start is after trim end")]
    Inverted,
    #[error("trim span {span:.3}s exceeds ceiling {ceiling:.3}s")]
    SpanCeiling { span: f64, ceiling: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("a render is already in progress")]
    ConcurrentRenderRejected,

    #[error("no {0} track loaded")]
    MissingTrack(TrackKind),

    #[error(transparent)]
    Load(#[from] MediaLoadError),

    #[error(transparent)]
    Render(#[from] RenderFailure),

    #[error("storage backend: {0}")]
    Backend(String),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
