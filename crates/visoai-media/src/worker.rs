// crates/visoai-media/src/worker.rs
//
// MediaWorker: owns the session temp directory, the probe/load threads, the
// render thread, and the preview decode thread. All public API that
// visoai-ui calls lives here; results come back over crossbeam channels.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::{Condvar, Mutex};
use tempfile::TempDir;

use visoai_core::error::EditorError;
use visoai_core::media_types::{MediaResult, PlaybackFrame};
use visoai_core::render_job::RenderRequest;
use visoai_core::track::TrackKind;

use crate::cli::FfmpegCli;
use crate::decode::LiveDecoder;
use crate::loader::{load_file, load_stored_video};
use crate::probe::probe_video_size;
use crate::render::run_render;

/// At most this many probe/load jobs run at once.
const LOAD_CONCURRENCY: u32 = 2;

/// Preview frames are scaled to at most this width.
pub const PREVIEW_MAX_WIDTH: u32 = 960;

enum PlaybackCmd {
    /// Decode continuously from `ts`.
    Start { session: u64, path: PathBuf, ts: f64 },
    /// Decode the single frame at `ts` and stop.
    Still { session: u64, path: PathBuf, ts: f64 },
    Stop,
}

/// Counting semaphore gating load threads.
struct LoadGate {
    active: Mutex<u32>,
    cvar:   Condvar,
}

struct GatePermit(Arc<LoadGate>);

impl LoadGate {
    fn acquire(self: &Arc<Self>) -> GatePermit {
        let mut n = self.active.lock();
        while *n >= LOAD_CONCURRENCY {
            self.cvar.wait(&mut n);
        }
        *n += 1;
        GatePermit(Arc::clone(self))
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        *self.0.active.lock() -= 1;
        self.0.cvar.notify_one();
    }
}

pub struct MediaWorker {
    /// Loads, render progress and completion.
    pub rx:      Receiver<MediaResult>,
    tx:          Sender<MediaResult>,
    /// Preview pipeline.
    pb_tx:       Sender<PlaybackCmd>,
    pub pb_rx:   Receiver<PlaybackFrame>,
    shutdown:    Arc<AtomicBool>,
    load_gate:   Arc<LoadGate>,
    render_busy: Arc<AtomicBool>,
    ffmpeg:      FfmpegCli,
    /// Stored-video copies and render outputs. Removed when the worker drops.
    session_dir: TempDir,
}

impl MediaWorker {
    pub fn new(ffmpeg: FfmpegCli) -> Result<Self> {
        let session_dir = tempfile::Builder::new()
            .prefix("visoai-")
            .tempdir()
            .context("create session temp dir")?;
        log::info!("[media] session dir {}", session_dir.path().display());

        let (tx, rx) = bounded(256);

        // ── Preview decode thread ─────────────────────────────────────────────
        // Runs ahead of the UI filling a bounded channel; a full channel blocks
        // send(), which is the rate limiter.
        let (pb_tx, pb_cmd_rx)   = bounded::<PlaybackCmd>(4);
        let (pb_frame_tx, pb_rx) = bounded::<PlaybackFrame>(24);
        thread::Builder::new()
            .name("visoai-preview".into())
            .spawn(move || preview_loop(pb_cmd_rx, pb_frame_tx))
            .context("spawn preview thread")?;

        Ok(Self {
            rx, tx, pb_tx, pb_rx,
            shutdown:    Arc::new(AtomicBool::new(false)),
            load_gate:   Arc::new(LoadGate { active: Mutex::new(0), cvar: Condvar::new() }),
            render_busy: Arc::new(AtomicBool::new(false)),
            ffmpeg,
            session_dir,
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.pb_tx.try_send(PlaybackCmd::Stop);
    }

    // ── Loading ──────────────────────────────────────────────────────────────

    /// Probe a user file for a `kind` track on a background thread.
    pub fn load_file(&self, kind: TrackKind, path: PathBuf) {
        let tx   = self.tx.clone();
        let sd   = self.shutdown.clone();
        let gate = self.load_gate.clone();
        thread::spawn(move || {
            let _permit = gate.acquire();
            if sd.load(Ordering::Relaxed) { return; }

            let result = match load_file(kind, &path) {
                Ok(media) => {
                    if kind == TrackKind::Video {
                        if let Some((width, height)) = probe_video_size(&path) {
                            let _ = tx.send(MediaResult::VideoSize { width, height });
                        }
                    }
                    MediaResult::TrackLoaded(media)
                }
                Err(e) => {
                    log::warn!("[loader] {e}");
                    MediaResult::LoadFailed(e)
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Write a stored video's bytes to the session dir and split it into
    /// video-only and audio-carrying sources.
    pub fn load_stored_video(&self, bytes: Vec<u8>, label: String) {
        let tx     = self.tx.clone();
        let sd     = self.shutdown.clone();
        let gate   = self.load_gate.clone();
        let cli    = self.ffmpeg.clone();
        let dir    = self.session_dir.path().to_path_buf();
        thread::spawn(move || {
            let _permit = gate.acquire();
            if sd.load(Ordering::Relaxed) { return; }

            let result = match load_stored_video(&bytes, &label, &dir, &cli) {
                Ok((video, audio)) => {
                    if let Some((width, height)) = probe_video_size(&video.path) {
                        let _ = tx.send(MediaResult::VideoSize { width, height });
                    }
                    MediaResult::StoredVideoLoaded { video, audio }
                }
                Err(e) => {
                    log::warn!("[loader] stored video \"{label}\": {e}");
                    MediaResult::LoadFailed(e)
                }
            };
            let _ = tx.send(result);
        });
    }

    // ── Render ───────────────────────────────────────────────────────────────

    /// Run `req` on a background thread. Only one render runs at a time; a
    /// second request while busy is rejected without touching the first.
    pub fn start_render(&self, req: RenderRequest, progress_every: Duration) -> Result<(), EditorError> {
        if self.render_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EditorError::ConcurrentRenderRejected);
        }

        let tx   = self.tx.clone();
        let busy = self.render_busy.clone();
        let sd   = self.shutdown.clone();
        let cli  = self.ffmpeg.clone();
        let dir  = self.session_dir.path().to_path_buf();

        thread::spawn(move || {
            let job_id = req.job_id;
            let mut last_sent: Option<Instant> = None;
            let result = run_render(&req, &cli, &dir, |fraction| {
                if sd.load(Ordering::Relaxed) { return; }
                if last_sent.map_or(true, |t| t.elapsed() >= progress_every) {
                    last_sent = Some(Instant::now());
                    let _ = tx.try_send(MediaResult::RenderProgress { job_id, fraction });
                }
            });
            busy.store(false, Ordering::Release);

            let msg = match result {
                Ok(path)     => MediaResult::RenderDone { job_id, path },
                Err(failure) => MediaResult::RenderFailed { job_id, failure },
            };
            let _ = tx.send(msg);
        });
        Ok(())
    }

    // ── Preview ──────────────────────────────────────────────────────────────

    /// Start streaming frames of `path` from `ts` seconds, tagged `session`.
    pub fn start_playback(&self, session: u64, path: PathBuf, ts: f64) {
        // Flush frames left over from the previous session.
        while self.pb_rx.try_recv().is_ok() {}
        let _ = self.pb_tx.try_send(PlaybackCmd::Start { session, path, ts });
    }

    /// Decode a single still frame at `ts` (shown while stopped).
    pub fn show_frame(&self, session: u64, path: PathBuf, ts: f64) {
        while self.pb_rx.try_recv().is_ok() {}
        let _ = self.pb_tx.try_send(PlaybackCmd::Still { session, path, ts });
    }

    pub fn stop_playback(&self) {
        let _ = self.pb_tx.try_send(PlaybackCmd::Stop);
        // Unblock a decoder parked on a full frame channel so it sees Stop.
        while self.pb_rx.try_recv().is_ok() {}
    }
}

impl Drop for MediaWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn open_at(path: &PathBuf, ts: f64) -> Option<LiveDecoder> {
    match LiveDecoder::open(path, ts, PREVIEW_MAX_WIDTH) {
        Ok(mut d) => {
            let target = d.ts_to_pts(ts);
            d.burn_to_pts(target);
            Some(d)
        }
        Err(e) => {
            log::warn!("[preview] open {}: {e:#}", path.display());
            None
        }
    }
}

fn send_frame(tx: &Sender<PlaybackFrame>, session: u64, d: &mut LiveDecoder) -> Option<bool> {
    let (data, width, height, timestamp) = d.next_frame()?;
    Some(tx.send(PlaybackFrame { session, timestamp, width, height, data }).is_ok())
}

fn preview_loop(cmd_rx: Receiver<PlaybackCmd>, frame_tx: Sender<PlaybackFrame>) {
    let mut active: Option<(u64, LiveDecoder)> = None;
    loop {
        let cmd = if active.is_some() {
            match cmd_rx.try_recv() {
                Ok(c)                           => Some(c),
                Err(TryRecvError::Empty)        => None,
                Err(TryRecvError::Disconnected) => return,
            }
        } else {
            match cmd_rx.recv() {
                Ok(c)  => Some(c),
                Err(_) => return,
            }
        };

        match cmd {
            Some(PlaybackCmd::Start { session, path, ts }) => {
                active = open_at(&path, ts).map(|d| (session, d));
                continue;
            }
            Some(PlaybackCmd::Still { session, path, ts }) => {
                active = None;
                if let Some(mut d) = open_at(&path, ts) {
                    if send_frame(&frame_tx, session, &mut d) == Some(false) { return; }
                }
                continue;
            }
            Some(PlaybackCmd::Stop) => {
                active = None;
                continue;
            }
            None => {}
        }

        if let Some((session, d)) = active.as_mut() {
            match send_frame(&frame_tx, *session, d) {
                Some(true)  => {}
                Some(false) => return,
                None        => {
                    log::debug!("[preview] end of stream");
                    active = None;
                }
            }
        }
    }
}
