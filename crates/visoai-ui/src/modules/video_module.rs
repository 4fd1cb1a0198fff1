// crates/visoai-ui/src/modules/video_module.rs
//
// VideoModule: the video media element. Frames are decoded on the worker's
// preview thread; this module asks for them and promotes them to a texture
// when their timestamp is due.
//
// The clock drives it through VideoElement, a short-lived adapter that pairs
// the module with the worker for the duration of one Editor call.

use std::path::PathBuf;

use eframe::egui;

use visoai_core::error::PlaybackDeviceError;
use visoai_core::media_types::PlaybackFrame;
use visoai_core::playback::MediaElement;
use visoai_core::track::TrackKind;
use visoai_media::MediaWorker;

/// A stopped playhead that moves further than this asks for a new still.
const STILL_EPSILON: f64 = 0.010;
/// Frames more than this behind the playhead are skipped while playing.
const FRAME_SLACK:   f64 = 1.0 / 30.0;
/// A frame may be shown this far ahead of its timestamp.
const FRAME_LEAD:    f64 = 1.0 / 60.0;

pub struct VideoModule {
    source:   Option<PathBuf>,
    /// Bumped on every start/still/stop; frames tagged with an older session are dropped.
    session:  u64,
    playing:  bool,
    seek_to:  f64,
    /// Next frame to show, held until its timestamp is due.
    pending:  Option<PlaybackFrame>,
    texture:  Option<egui::TextureHandle>,
    still_at: Option<f64>,
}

impl VideoModule {
    pub fn new() -> Self {
        Self {
            source:   None,
            session:  0,
            playing:  false,
            seek_to:  0.0,
            pending:  None,
            texture:  None,
            still_at: None,
        }
    }

    pub fn texture(&self) -> Option<&egui::TextureHandle> { self.texture.as_ref() }

    pub fn set_source(&mut self, path: Option<PathBuf>) {
        self.session += 1;
        self.playing  = false;
        self.seek_to  = 0.0;
        self.pending  = None;
        self.texture  = None;
        self.still_at = None;
        self.source   = path;
    }

    // ── poll ──────────────────────────────────────────────────────────────────
    /// PTS-gated frame consumption. Call once per frame before the UI pass.
    ///
    /// The decode thread runs ahead filling a bounded channel. Draining it and
    /// showing the newest frame would race ahead of the clock, so one frame is
    /// held in `pending` until `current_time` reaches its timestamp.
    pub fn poll(&mut self, worker: &MediaWorker, current_time: f64, egui_ctx: &egui::Context) {
        if !self.playing {
            self.request_still(worker, current_time);
        }

        if self.pending.as_ref().is_some_and(|f| f.session != self.session) {
            self.pending = None;
        }
        if self.pending.is_none() {
            self.pending = self.recv_current(worker);
        }

        let due = if self.playing {
            while self.pending.as_ref().is_some_and(|f| f.timestamp < current_time - FRAME_SLACK) {
                match self.recv_current(worker) {
                    Some(newer) => self.pending = Some(newer),
                    None        => break,
                }
            }
            self.pending.as_ref().is_some_and(|f| f.timestamp <= current_time + FRAME_LEAD)
        } else {
            self.pending.is_some()
        };

        if due {
            if let Some(f) = self.pending.take() {
                self.upload(egui_ctx, f);
                egui_ctx.request_repaint();
                self.pending = self.recv_current(worker);
            }
        }
    }

    fn request_still(&mut self, worker: &MediaWorker, t: f64) {
        let Some(path) = &self.source else { return };
        let moved = self.still_at.map_or(true, |last| (last - t).abs() > STILL_EPSILON);
        if !moved {
            return;
        }
        self.session += 1;
        self.pending  = None;
        self.still_at = Some(t);
        worker.show_frame(self.session, path.clone(), t);
    }

    fn recv_current(&self, worker: &MediaWorker) -> Option<PlaybackFrame> {
        while let Ok(f) = worker.pb_rx.try_recv() {
            if f.session == self.session {
                return Some(f);
            }
        }
        None
    }

    fn upload(&mut self, egui_ctx: &egui::Context, f: PlaybackFrame) {
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [f.width as usize, f.height as usize], &f.data,
        );
        match &mut self.texture {
            Some(tex) => tex.set(image, egui::TextureOptions::LINEAR),
            None      => {
                self.texture = Some(egui_ctx.load_texture("video-preview", image, egui::TextureOptions::LINEAR));
            }
        }
    }
}

impl Default for VideoModule {
    fn default() -> Self { Self::new() }
}

// ── MediaElement adapter ──────────────────────────────────────────────────────

pub struct VideoElement<'a> {
    pub module: &'a mut VideoModule,
    pub worker: &'a MediaWorker,
}

impl VideoElement<'_> {
    fn restart(&mut self) -> Result<(), PlaybackDeviceError> {
        let path = self.module.source.clone().ok_or_else(|| PlaybackDeviceError {
            kind:   TrackKind::Video,
            reason: "no video source".into(),
        })?;
        let m = &mut *self.module;
        m.session += 1;
        m.pending  = None;
        m.still_at = None;
        m.playing  = true;
        self.worker.start_playback(m.session, path, m.seek_to);
        Ok(())
    }
}

impl MediaElement for VideoElement<'_> {
    fn kind(&self) -> TrackKind { TrackKind::Video }

    fn seek(&mut self, secs: f64) {
        self.module.seek_to = secs.max(0.0);
        if self.module.playing {
            if let Err(e) = self.restart() {
                log::warn!("[video] {e}");
            }
        }
    }

    fn play(&mut self) -> Result<(), PlaybackDeviceError> {
        if self.module.playing {
            return Ok(());
        }
        self.restart()
    }

    fn pause(&mut self) {
        if !self.module.playing {
            return;
        }
        let m = &mut *self.module;
        m.playing = false;
        m.session += 1;
        m.pending  = None;
        self.worker.stop_playback();
    }
}
