// crates/visoai-core/src/playback.rs
//
// Synchronized playback clock.
//
// One logical transport drives two independent media elements. The playhead
// is derived from wall-clock time captured at start, never from either
// element's own position, so a stalled audio decoder cannot drag the video
// (or the playhead) with it.
//
// State machine:
//
//   Stopped ──start()──▶ Playing ──stop() / current_time >= video trim end──▶ Stopped
//
// On start:
//   sync_offset = video.trim_start - audio.trim_start
//   sync_offset >= 0 → audio seeks to sync_offset and plays with the video
//   sync_offset <  0 → audio seeks to 0 and its play() is deferred by -sync_offset
//
// Trimming is a logical overlay here: the elements play the untrimmed sources
// and the clock enforces the bounds. Trims are only materialised by the render.
//
// The frame loop calls tick() with the TickHandle returned by start(). Every
// start() opens a new session generation, so a tick scheduled for an older
// session is ignored instead of acting on the new one.

use crate::error::PlaybackDeviceError;
use crate::track::{TrackKind, Tracks};

/// A playable preview of one track. Implemented by the UI's video frame
/// pipeline and audio sink; tests use a recording mock.
pub trait MediaElement {
    fn kind(&self) -> TrackKind;
    /// Position the element at `secs` into its source.
    fn seek(&mut self, secs: f64);
    /// Start (or resume) output from the current position.
    fn play(&mut self) -> Result<(), PlaybackDeviceError>;
    fn pause(&mut self);
}

/// Identifies the playback session a tick belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    Playing  { current_time: f64 },
    /// The video trim end was reached on this tick; the clock is stopped.
    Finished { current_time: f64 },
    /// The handle does not belong to the active session.
    Stale,
}

/// A deferred audio play() call. Dropping it is the cancellation.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingAudioStart {
    due_at: f64,
}

#[derive(Debug)]
struct PlaybackSession {
    generation:    u64,
    clock_origin:  f64,
    current_time:  f64,
    video_start:   f64,
    video_end:     f64,
    pending_audio: Option<PendingAudioStart>,
    /// Wall-clock instant the audio should fall silent: the audio selection
    /// is only as long as its own trim range.
    audio_stop_at: Option<f64>,
    audio_len:     f64,
}

#[derive(Debug, Default)]
pub struct PlaybackClock {
    generation: u64,
    session:    Option<PlaybackSession>,
    /// Playhead shown while stopped.
    last_time:  f64,
    notices:    Vec<PlaybackDeviceError>,
}

impl PlaybackClock {
    pub fn new() -> Self { Self::default() }

    pub fn is_playing(&self) -> bool { self.session.is_some() }

    pub fn current_time(&self) -> f64 {
        self.session.as_ref().map(|s| s.current_time).unwrap_or(self.last_time)
    }

    pub fn active_handle(&self) -> Option<TickHandle> {
        self.session.as_ref().map(|s| TickHandle(s.generation))
    }

    pub fn has_pending_audio_start(&self) -> bool {
        self.session.as_ref().map(|s| s.pending_audio.is_some()).unwrap_or(false)
    }

    /// Move the stopped playhead (e.g. after a trim change). Ignored while playing.
    pub fn park_at(&mut self, t: f64) {
        if self.session.is_none() && t.is_finite() {
            self.last_time = t.max(0.0);
        }
    }

    /// Non-fatal device errors collected since the last call.
    pub fn take_notices(&mut self) -> Vec<PlaybackDeviceError> {
        std::mem::take(&mut self.notices)
    }

    /// Begin playback at the video trim start.
    ///
    /// Returns the tick handle for the new session, the active handle if
    /// already playing (no-op), or None when no video track is loaded.
    pub fn start(
        &mut self,
        tracks: &Tracks,
        video:  &mut dyn MediaElement,
        audio:  &mut dyn MediaElement,
        now:    f64,
    ) -> Option<TickHandle> {
        debug_assert_eq!(video.kind(), TrackKind::Video, "video element in audio slot");
        debug_assert_eq!(audio.kind(), TrackKind::Audio, "audio element in video slot");
        if let Some(handle) = self.active_handle() {
            return Some(handle);
        }
        let v = tracks.video.as_ref()?;

        self.generation += 1;
        let video_start = v.trim_start();
        let video_end   = v.trim_end();

        video.seek(video_start);
        self.try_play(video);

        let mut pending_audio = None;
        let mut audio_stop_at = None;
        let mut audio_len     = 0.0;

        if let Some(a) = tracks.audio.as_ref() {
            audio_len = a.trim.span();
            let sync_offset = video_start - a.trim_start();
            if sync_offset >= 0.0 {
                audio.seek(sync_offset);
                self.try_play(audio);
                audio_stop_at = Some(now + audio_len);
            } else {
                audio.seek(0.0);
                pending_audio = Some(PendingAudioStart { due_at: now - sync_offset });
            }
            log::debug!("[playback] sync_offset={sync_offset:.3}s audio_len={audio_len:.3}s");
        }

        log::info!(
            "[playback] start session {} at {video_start:.3}s (ends {video_end:.3}s)",
            self.generation,
        );

        self.session = Some(PlaybackSession {
            generation:   self.generation,
            clock_origin: now,
            current_time: video_start,
            video_start,
            video_end,
            pending_audio,
            audio_stop_at,
            audio_len,
        });
        Some(TickHandle(self.generation))
    }

    /// Advance the playhead. Call once per frame while playing.
    pub fn tick(
        &mut self,
        handle: TickHandle,
        video:  &mut dyn MediaElement,
        audio:  &mut dyn MediaElement,
        now:    f64,
    ) -> TickOutcome {
        let Some(session) = self.session.as_mut() else { return TickOutcome::Stale };
        if session.generation != handle.0 {
            return TickOutcome::Stale;
        }

        session.current_time = session.video_start + (now - session.clock_origin).max(0.0);

        if session.current_time >= session.video_end {
            let end = session.video_end;
            self.halt(video, audio, end);
            log::info!("[playback] reached trim end at {end:.3}s");
            return TickOutcome::Finished { current_time: end };
        }

        let current_time = session.current_time;

        let due = session.pending_audio.filter(|p| now >= p.due_at);
        if let Some(p) = due {
            session.pending_audio = None;
            session.audio_stop_at = Some(p.due_at + session.audio_len);
            if let Err(e) = audio.play() {
                log::warn!("[playback] {e}");
                self.notices.push(e);
            }
            return TickOutcome::Playing { current_time };
        }

        if let Some(stop_at) = session.audio_stop_at {
            if now >= stop_at {
                session.audio_stop_at = None;
                audio.pause();
                log::debug!("[playback] audio selection exhausted");
            }
        }

        TickOutcome::Playing { current_time }
    }

    /// Stop playback. Pauses both elements and cancels a pending audio start.
    /// Safe to call when already stopped; returns whether anything was stopped.
    pub fn stop(&mut self, video: &mut dyn MediaElement, audio: &mut dyn MediaElement) -> bool {
        let Some(t) = self.session.as_ref().map(|s| s.current_time) else { return false };
        self.halt(video, audio, t);
        log::info!("[playback] stopped at {t:.3}s");
        true
    }

    fn halt(&mut self, video: &mut dyn MediaElement, audio: &mut dyn MediaElement, at: f64) {
        video.pause();
        audio.pause();
        self.session   = None;
        self.last_time = at;
    }

    fn try_play(&mut self, el: &mut dyn MediaElement) {
        if let Err(e) = el.play() {
            log::warn!("[playback] {} element: {e}", el.kind());
            self.notices.push(e);
        }
    }
}

// ── Test support ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum Op {
        Seek(f64),
        Play,
        Pause,
    }

    pub struct MockElement {
        pub kind:      TrackKind,
        pub ops:       Vec<Op>,
        pub fail_play: bool,
    }

    impl MockElement {
        pub fn new(kind: TrackKind) -> Self {
            Self { kind, ops: Vec::new(), fail_play: false }
        }

        pub fn last(&self) -> Option<Op> { self.ops.last().copied() }
    }

    impl MediaElement for MockElement {
        fn kind(&self) -> TrackKind { self.kind }
        fn seek(&mut self, secs: f64) { self.ops.push(Op::Seek(secs)); }
        fn play(&mut self) -> Result<(), PlaybackDeviceError> {
            self.ops.push(Op::Play);
            if self.fail_play {
                Err(PlaybackDeviceError { kind: self.kind, reason: "no output device".into() })
            } else {
                Ok(())
            }
        }
        fn pause(&mut self) { self.ops.push(Op::Pause); }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockElement, Op};
    use super::*;
    use crate::preview::PreviewRegistry;
    use crate::track::MediaTrack;
    use crate::trim::TrimRange;
    use std::path::PathBuf;

    fn track(reg: &mut PreviewRegistry, total: f64, start: f64, end: f64) -> MediaTrack {
        let mut trim = TrimRange::new(total);
        trim.propose(start, end);
        MediaTrack {
            source:         PathBuf::from("src"),
            preview:        reg.allocate(PathBuf::from("src"), false),
            total_duration: total,
            trim,
            label:          "t".into(),
        }
    }

    fn tracks(video: (f64, f64), audio: Option<(f64, f64)>) -> (PreviewRegistry, Tracks) {
        let mut reg = PreviewRegistry::new();
        let video = Some(track(&mut reg, 30.0, video.0, video.1));
        let audio = audio.map(|(s, e)| track(&mut reg, 30.0, s, e));
        (reg, Tracks { video, audio })
    }

    fn elements() -> (MockElement, MockElement) {
        (MockElement::new(TrackKind::Video), MockElement::new(TrackKind::Audio))
    }

    #[test]
    fn positive_offset_seeks_audio_and_plays_immediately() {
        let (_reg, t) = tracks((3.0, 10.0), Some((1.0, 10.0)));
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        clock.start(&t, &mut v, &mut a, 100.0).unwrap();

        assert_eq!(v.ops, vec![Op::Seek(3.0), Op::Play]);
        assert_eq!(a.ops, vec![Op::Seek(2.0), Op::Play]);
        assert!(!clock.has_pending_audio_start());
        assert_eq!(clock.current_time(), 3.0);
    }

    #[test]
    fn negative_offset_defers_audio_start() {
        let (_reg, t) = tracks((1.0, 10.0), Some((4.0, 10.0)));
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        let h = clock.start(&t, &mut v, &mut a, 100.0).unwrap();
        assert_eq!(a.ops, vec![Op::Seek(0.0)]);
        assert!(clock.has_pending_audio_start());

        clock.tick(h, &mut v, &mut a, 102.9);
        assert_eq!(a.ops, vec![Op::Seek(0.0)]);

        let out = clock.tick(h, &mut v, &mut a, 103.0);
        assert_eq!(out, TickOutcome::Playing { current_time: 4.0 });
        assert_eq!(a.last(), Some(Op::Play));
        assert!(!clock.has_pending_audio_start());
    }

    #[test]
    fn auto_stops_at_video_trim_end() {
        let (_reg, t) = tracks((0.0, 5.0), Some((0.0, 20.0)));
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        let h = clock.start(&t, &mut v, &mut a, 0.0).unwrap();
        assert_eq!(clock.tick(h, &mut v, &mut a, 4.9), TickOutcome::Playing { current_time: 4.9 });

        let out = clock.tick(h, &mut v, &mut a, 5.0);
        assert_eq!(out, TickOutcome::Finished { current_time: 5.0 });
        assert!(!clock.is_playing());
        assert!(!clock.has_pending_audio_start());
        assert_eq!(v.last(), Some(Op::Pause));
        assert_eq!(a.last(), Some(Op::Pause));
        assert_eq!(clock.current_time(), 5.0);
    }

    #[test]
    fn stop_cancels_pending_audio_start() {
        let (_reg, t) = tracks((0.0, 10.0), Some((5.0, 10.0)));
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        let h = clock.start(&t, &mut v, &mut a, 0.0).unwrap();
        assert!(clock.has_pending_audio_start());
        assert!(clock.stop(&mut v, &mut a));
        assert!(!clock.has_pending_audio_start());

        // The old session's tick must not fire the deferred play().
        assert_eq!(clock.tick(h, &mut v, &mut a, 6.0), TickOutcome::Stale);
        assert!(!a.ops.contains(&Op::Play));
    }

    #[test]
    fn stop_twice_is_harmless() {
        let (_reg, t) = tracks((0.0, 10.0), None);
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        clock.start(&t, &mut v, &mut a, 0.0);
        assert!(clock.stop(&mut v, &mut a));
        assert!(!clock.stop(&mut v, &mut a));
        assert!(!clock.is_playing());
    }

    #[test]
    fn start_while_playing_is_a_no_op() {
        let (_reg, t) = tracks((2.0, 10.0), Some((2.0, 10.0)));
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        let h1 = clock.start(&t, &mut v, &mut a, 0.0);
        let ops_before = v.ops.len();
        let h2 = clock.start(&t, &mut v, &mut a, 1.0);
        assert_eq!(h1, h2);
        assert_eq!(v.ops.len(), ops_before);
    }

    #[test]
    fn restart_invalidates_old_handle() {
        let (_reg, t) = tracks((0.0, 10.0), None);
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        let old = clock.start(&t, &mut v, &mut a, 0.0).unwrap();
        clock.stop(&mut v, &mut a);
        let new = clock.start(&t, &mut v, &mut a, 50.0).unwrap();

        assert_ne!(old, new);
        assert_eq!(clock.tick(old, &mut v, &mut a, 51.0), TickOutcome::Stale);
        assert_eq!(clock.tick(new, &mut v, &mut a, 51.0), TickOutcome::Playing { current_time: 1.0 });
    }

    #[test]
    fn rejected_play_is_a_notice_and_clock_keeps_running() {
        let (_reg, t) = tracks((0.0, 10.0), Some((0.0, 10.0)));
        let (mut v, mut a) = elements();
        a.fail_play = true;
        let mut clock = PlaybackClock::new();

        let h = clock.start(&t, &mut v, &mut a, 0.0).unwrap();
        let notices = clock.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, TrackKind::Audio);
        assert!(clock.take_notices().is_empty());

        assert_eq!(clock.tick(h, &mut v, &mut a, 2.5), TickOutcome::Playing { current_time: 2.5 });
    }

    #[test]
    fn audio_falls_silent_after_its_selection() {
        let (_reg, t) = tracks((0.0, 8.0), Some((0.0, 2.0)));
        let (mut v, mut a) = elements();
        let mut clock = PlaybackClock::new();

        let h = clock.start(&t, &mut v, &mut a, 0.0).unwrap();
        clock.tick(h, &mut v, &mut a, 1.0);
        assert_eq!(a.last(), Some(Op::Play));
        clock.tick(h, &mut v, &mut a, 2.0);
        assert_eq!(a.last(), Some(Op::Pause));
        assert!(clock.is_playing());
    }

    #[test]
    fn no_video_track_means_no_playback() {
        let mut clock = PlaybackClock::new();
        let (mut v, mut a) = elements();
        assert!(clock.start(&Tracks::default(), &mut v, &mut a, 0.0).is_none());
        assert!(v.ops.is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "video element in audio slot")]
    fn swapped_elements_are_caught() {
        let (_reg, tracks) = tracks((0.0, 5.0), None);
        let mut clock = PlaybackClock::new();
        let (mut v, mut a) = elements();
        clock.start(&tracks, &mut a, &mut v, 0.0);
    }
}
