// crates/visoai-core/src/editor.rs
//
// The Editor aggregate: exclusive owner of both tracks, the playback clock,
// the render job, and every preview handle issued during the session.
//
// All mutation goes through the methods below; app.rs translates
// EditorCommands and MediaResults into these calls.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::CodecSettings;
use crate::error::{EditorError, MediaLoadError, PlaybackDeviceError, RenderFailure, Result};
use crate::playback::{MediaElement, PlaybackClock, TickHandle, TickOutcome};
use crate::preview::{PreviewRegistry, PreviewUrl};
use crate::render_job::{ReconcilePlan, RenderJob, RenderRequest, TrackSelection};
use crate::track::{LoadedMedia, MediaTrack, TrackKind, Tracks};
use crate::trim::{TrimRange, TrimUpdate, DEFAULT_MIN_SPAN};

#[derive(Debug)]
pub struct Editor {
    tracks:   Tracks,
    clock:    PlaybackClock,
    render:   RenderJob,
    previews: PreviewRegistry,
    /// Replaced track handles an encoding job may still be reading. Released
    /// once the job settles.
    retired:  Vec<PreviewUrl>,
    min_span: f64,
}

impl Default for Editor {
    fn default() -> Self { Self::new(DEFAULT_MIN_SPAN) }
}

impl Editor {
    pub fn new(min_span: f64) -> Self {
        Self {
            tracks:   Tracks::default(),
            clock:    PlaybackClock::new(),
            render:   RenderJob::default(),
            previews: PreviewRegistry::new(),
            retired:  Vec::new(),
            min_span,
        }
    }

    pub fn tracks(&self)   -> &Tracks          { &self.tracks }
    pub fn clock(&self)    -> &PlaybackClock   { &self.clock }
    pub fn render(&self)   -> &RenderJob       { &self.render }
    pub fn previews(&self) -> &PreviewRegistry { &self.previews }

    pub fn is_playing(&self)   -> bool { self.clock.is_playing() }
    pub fn current_time(&self) -> f64  { self.clock.current_time() }

    /// Local file behind a track's preview handle.
    pub fn preview_path(&self, kind: TrackKind) -> Option<&Path> {
        self.tracks.get(kind).and_then(|t| self.previews.resolve(&t.preview))
    }

    pub fn render_output_path(&self) -> Option<&Path> {
        self.render.output().and_then(|u| self.previews.resolve(u))
    }

    // ── Media loading ────────────────────────────────────────────────────────

    /// Put freshly loaded media into its track slot.
    ///
    /// Stops playback if running, allocates a new preview handle, releases the
    /// slot's previous handle exactly once, and resets the trim to the full
    /// duration. While a render is encoding the previous handle is held back
    /// until the job settles, since its source is one of the job's inputs.
    pub fn install_track(
        &mut self,
        media: LoadedMedia,
        video: &mut dyn MediaElement,
        audio: &mut dyn MediaElement,
    ) -> Result<&MediaTrack> {
        if !media.duration.is_finite() || media.duration <= 0.0 {
            return Err(MediaLoadError::new(
                media.kind,
                format!("unusable duration {}", media.duration),
            ).into());
        }

        if self.clock.stop(video, audio) {
            log::info!("[editor] playback stopped: {} track replaced", media.kind);
        }

        let kind    = media.kind;
        let preview = self.previews.allocate(media.path.clone(), media.owned);
        let track   = MediaTrack {
            source:         media.path,
            preview,
            total_duration: media.duration,
            trim:           TrimRange::new(media.duration).with_min_span(self.min_span),
            label:          media.label,
        };
        log::info!(
            "[editor] {kind} track ← \"{}\" ({:.2}s) as {}",
            track.label, track.total_duration, track.preview,
        );

        if let Some(old) = self.tracks.replace(kind, track) {
            if self.render.is_encoding() {
                log::debug!("[editor] holding {} until the render settles", old.preview);
                self.retired.push(old.preview);
            } else {
                self.previews.release(old.preview);
            }
        }
        if kind == TrackKind::Video {
            self.clock.park_at(0.0);
        }

        self.tracks.get(kind).ok_or(EditorError::MissingTrack(kind))
    }

    // ── Trim ─────────────────────────────────────────────────────────────────

    pub fn update_trim(&mut self, kind: TrackKind, start: f64, end: f64) -> TrimUpdate {
        let Some(track) = self.tracks.get_mut(kind) else { return TrimUpdate::Rejected };
        let update = track.trim.propose(start, end);
        if let TrimUpdate::Applied { start, .. } = update {
            if kind == TrackKind::Video {
                self.clock.park_at(start);
            }
        }
        update
    }

    // ── Playback ─────────────────────────────────────────────────────────────

    pub fn start_playback(
        &mut self,
        video: &mut dyn MediaElement,
        audio: &mut dyn MediaElement,
        now:   f64,
    ) -> Option<TickHandle> {
        self.clock.start(&self.tracks, video, audio, now)
    }

    pub fn stop_playback(&mut self, video: &mut dyn MediaElement, audio: &mut dyn MediaElement) -> bool {
        self.clock.stop(video, audio)
    }

    pub fn tick(
        &mut self,
        handle: TickHandle,
        video:  &mut dyn MediaElement,
        audio:  &mut dyn MediaElement,
        now:    f64,
    ) -> TickOutcome {
        self.clock.tick(handle, video, audio, now)
    }

    pub fn take_playback_notices(&mut self) -> Vec<PlaybackDeviceError> {
        self.clock.take_notices()
    }

    // ── Render ───────────────────────────────────────────────────────────────

    /// Validate and open a new render job. Nothing changes on rejection.
    pub fn begin_render(&mut self, codec: &CodecSettings) -> Result<RenderRequest> {
        if self.render.is_encoding() {
            return Err(EditorError::ConcurrentRenderRejected);
        }
        let video = self.selection(TrackKind::Video)?;
        let audio = self.selection(TrackKind::Audio)?;
        let plan  = ReconcilePlan::new(&video, &audio);

        let job_id = Uuid::new_v4();
        if let Some(old) = self.render.begin(job_id)? {
            self.previews.release(old);
        }
        log::info!(
            "[editor] render {job_id}: video {:.2}s, audio {:.2}s, delay {:.2}s, pad {:.2}s",
            plan.video_len, plan.audio_len, plan.leading_delay, plan.silence_padding,
        );
        Ok(RenderRequest { job_id, video, audio, plan, codec: codec.clone() })
    }

    pub fn on_render_progress(&mut self, job_id: Uuid, fraction: f64) -> bool {
        self.render.on_progress(job_id, fraction)
    }

    /// Adopt a finished render's output. Returns false for a stale job.
    pub fn on_render_done(&mut self, job_id: Uuid, output: PathBuf) -> bool {
        if !self.render.is_current(job_id) {
            log::warn!("[editor] ignoring output of stale render {job_id}");
            return false;
        }
        let url = self.previews.allocate(output, true);
        log::info!("[editor] render {job_id} done → {url}");
        self.render.finish(url);
        self.release_retired();
        true
    }

    pub fn on_render_failed(&mut self, job_id: Uuid, failure: RenderFailure) -> bool {
        if !self.render.is_current(job_id) {
            return false;
        }
        log::error!("[editor] render {job_id}: {failure}");
        self.render.fail(failure.to_string());
        self.release_retired();
        true
    }

    fn release_retired(&mut self) -> usize {
        let mut n = 0;
        for url in self.retired.drain(..) {
            n += self.previews.release(url) as usize;
        }
        n
    }

    pub fn dismiss_render_failure(&mut self) {
        self.render.dismiss_failure();
    }

    /// The plan a render would use right now, for display. None until both
    /// tracks are loaded.
    pub fn reconcile_preview(&self) -> Option<ReconcilePlan> {
        let video = self.selection(TrackKind::Video).ok()?;
        let audio = self.selection(TrackKind::Audio).ok()?;
        Some(ReconcilePlan::new(&video, &audio))
    }

    fn selection(&self, kind: TrackKind) -> Result<TrackSelection> {
        let track = self.tracks.get(kind).ok_or(EditorError::MissingTrack(kind))?;
        Ok(TrackSelection {
            source: track.source.clone(),
            start:  track.trim_start(),
            end:    track.trim_end(),
        })
    }

    // ── Teardown ─────────────────────────────────────────────────────────────

    /// Stop playback and give back every preview handle. Returns how many
    /// handles were released.
    pub fn teardown(&mut self, video: &mut dyn MediaElement, audio: &mut dyn MediaElement) -> usize {
        self.clock.stop(video, audio);
        let mut n = 0;
        for kind in TrackKind::ALL {
            if let Some(track) = self.tracks.take(kind) {
                n += self.previews.release(track.preview) as usize;
            }
        }
        if let Some(out) = self.render.take_output() {
            n += self.previews.release(out) as usize;
        }
        n += self.release_retired();
        n + self.previews.release_all()
    }
}
