// crates/visoai-core/src/render_job.rs
//
// Render job state machine plus the pure duration arithmetic behind the
// export pipeline. The FFmpeg steps themselves live in visoai-media; this
// module only decides *what* the pipeline has to produce.
//
//   Idle ──begin()──▶ Encoding ──finish()──▶ Done
//                        │
//                        └──fail()──▶ Failed ──begin()──▶ Encoding (retry)
//
// A job id is stamped at begin(); results carrying any other id are stale.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CodecSettings;
use crate::error::EditorError;
use crate::preview::PreviewUrl;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderStatus {
    #[default]
    Idle,
    Encoding,
    Done,
    Failed,
}

/// The trimmed interval of one source, as handed to the render pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackSelection {
    pub source: PathBuf,
    pub start:  f64,
    pub end:    f64,
}

impl TrackSelection {
    pub fn duration(&self) -> f64 { (self.end - self.start).max(0.0) }
}

/// How the trimmed audio is stretched onto the trimmed video's timeline.
///
/// ```
/// use std::path::PathBuf;
/// use visoai_core::render_job::{ReconcilePlan, TrackSelection};
///
/// let v = TrackSelection { source: PathBuf::from("v.mp4"), start: 0.0, end: 6.0 };
/// let a = TrackSelection { source: PathBuf::from("a.mp3"), start: 0.0, end: 4.0 };
/// let plan = ReconcilePlan::new(&v, &a);
/// assert_eq!(plan.leading_delay, 0.0);
/// assert_eq!(plan.silence_padding, 2.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconcilePlan {
    pub video_len:       f64,
    pub audio_len:       f64,
    /// Silence inserted before the audio.
    pub leading_delay:   f64,
    /// Silence appended after the (delayed) audio to reach the video length.
    pub silence_padding: f64,
}

impl ReconcilePlan {
    pub fn new(video: &TrackSelection, audio: &TrackSelection) -> Self {
        let video_len     = video.duration();
        let audio_len     = audio.duration();
        let leading_delay = (audio.start - video.start).max(0.0);
        let silence_padding = (video_len - (leading_delay + audio_len)).max(0.0);
        Self { video_len, audio_len, leading_delay, silence_padding }
    }

    pub fn needs_delay(&self)   -> bool { self.leading_delay > 0.0 }
    pub fn needs_padding(&self) -> bool { self.silence_padding > 0.0 }

    /// Audio length after delay and padding; anything past `video_len` is cut
    /// at merge time.
    pub fn padded_audio_len(&self) -> f64 {
        self.leading_delay + self.audio_len + self.silence_padding
    }
}

/// Everything the media worker needs to run one render.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    pub job_id: Uuid,
    pub video:  TrackSelection,
    pub audio:  TrackSelection,
    pub plan:   ReconcilePlan,
    pub codec:  CodecSettings,
}

#[derive(Debug, Default)]
pub struct RenderJob {
    status:           RenderStatus,
    job_id:           Option<Uuid>,
    progress_percent: u8,
    output:           Option<PreviewUrl>,
    error_message:    Option<String>,
}

impl RenderJob {
    pub fn status(&self)           -> RenderStatus         { self.status }
    pub fn job_id(&self)           -> Option<Uuid>         { self.job_id }
    pub fn progress_percent(&self) -> u8                   { self.progress_percent }
    pub fn output(&self)           -> Option<&PreviewUrl>  { self.output.as_ref() }
    pub fn error_message(&self)    -> Option<&str>         { self.error_message.as_deref() }

    pub fn is_encoding(&self) -> bool { self.status == RenderStatus::Encoding }

    pub fn is_current(&self, job_id: Uuid) -> bool {
        self.is_encoding() && self.job_id == Some(job_id)
    }

    /// Enter `Encoding` under `job_id`. Rejected without any state change while
    /// a job is already encoding. On success hands back the previous output so
    /// the caller can release it.
    pub fn begin(&mut self, job_id: Uuid) -> Result<Option<PreviewUrl>, EditorError> {
        if self.is_encoding() {
            return Err(EditorError::ConcurrentRenderRejected);
        }
        self.status           = RenderStatus::Encoding;
        self.job_id           = Some(job_id);
        self.progress_percent = 0;
        self.error_message    = None;
        Ok(self.output.take())
    }

    /// Map an overall pipeline fraction to a percentage. Never goes backwards
    /// and stays below 100 until the job is finished.
    pub fn on_progress(&mut self, job_id: Uuid, fraction: f64) -> bool {
        if !self.is_current(job_id) || !fraction.is_finite() {
            return false;
        }
        let pct = (fraction.clamp(0.0, 1.0) * 100.0).floor() as u8;
        let pct = pct.min(99);
        if pct <= self.progress_percent {
            return false;
        }
        self.progress_percent = pct;
        true
    }

    pub fn finish(&mut self, output: PreviewUrl) {
        self.status           = RenderStatus::Done;
        self.progress_percent = 100;
        self.output           = Some(output);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status        = RenderStatus::Failed;
        self.error_message = Some(message.into());
    }

    /// Clear a failure banner. No effect in any other state.
    pub fn dismiss_failure(&mut self) {
        if self.status == RenderStatus::Failed {
            self.status           = RenderStatus::Idle;
            self.error_message    = None;
            self.progress_percent = 0;
        }
    }

    /// Hand back the output handle on teardown.
    pub fn take_output(&mut self) -> Option<PreviewUrl> {
        self.output.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::PreviewRegistry;

    fn sel(start: f64, end: f64) -> TrackSelection {
        TrackSelection { source: PathBuf::from("x"), start, end }
    }

    #[test]
    fn short_audio_is_padded_to_video_length() {
        let plan = ReconcilePlan::new(&sel(0.0, 6.0), &sel(0.0, 4.0));
        assert_eq!(plan.leading_delay, 0.0);
        assert_eq!(plan.silence_padding, 2.0);
        assert!(!plan.needs_delay());
        assert_eq!(plan.padded_audio_len(), 6.0);
    }

    #[test]
    fn later_audio_start_becomes_leading_delay() {
        let plan = ReconcilePlan::new(&sel(1.0, 9.0), &sel(3.0, 6.0));
        assert_eq!(plan.leading_delay, 2.0);
        assert_eq!(plan.silence_padding, 3.0);
    }

    #[test]
    fn long_audio_needs_no_padding() {
        let plan = ReconcilePlan::new(&sel(0.0, 4.0), &sel(0.0, 10.0));
        assert!(!plan.needs_padding());
        assert_eq!(plan.silence_padding, 0.0);
    }

    #[test]
    fn second_begin_while_encoding_is_rejected() {
        let mut job = RenderJob::default();
        let first = Uuid::new_v4();
        job.begin(first).unwrap();
        job.on_progress(first, 0.3);

        let err = job.begin(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, EditorError::ConcurrentRenderRejected);
        assert_eq!(job.job_id(), Some(first));
        assert_eq!(job.progress_percent(), 30);
        assert_eq!(job.status(), RenderStatus::Encoding);
    }

    #[test]
    fn progress_is_monotone_and_bounded() {
        let mut job = RenderJob::default();
        let id = Uuid::new_v4();
        job.begin(id).unwrap();

        let mut last = 0;
        for f in [0.1, 0.05, 0.5, 0.49, 1.7, f64::NAN, -3.0, 0.99] {
            job.on_progress(id, f);
            assert!(job.progress_percent() >= last);
            assert!(job.progress_percent() <= 100);
            last = job.progress_percent();
        }
        assert_eq!(job.progress_percent(), 99);
    }

    #[test]
    fn stale_progress_is_ignored() {
        let mut job = RenderJob::default();
        job.begin(Uuid::new_v4()).unwrap();
        assert!(!job.on_progress(Uuid::new_v4(), 0.8));
        assert_eq!(job.progress_percent(), 0);
    }

    #[test]
    fn retry_after_failure_hands_back_previous_output() {
        let mut reg = PreviewRegistry::new();
        let mut job = RenderJob::default();

        let id = Uuid::new_v4();
        job.begin(id).unwrap();
        job.finish(reg.allocate(PathBuf::from("out.mp4"), false));
        assert_eq!(job.status(), RenderStatus::Done);
        assert_eq!(job.progress_percent(), 100);

        let old = job.begin(Uuid::new_v4()).unwrap();
        assert!(old.is_some());
        assert!(job.output().is_none());
        job.fail("merge: broken pipe");
        assert_eq!(job.error_message(), Some("merge: broken pipe"));

        job.dismiss_failure();
        assert_eq!(job.status(), RenderStatus::Idle);
        assert!(job.begin(Uuid::new_v4()).unwrap().is_none());
    }
}
