// crates/visoai-ui/src/modules/audio_module.rs
//
// AudioModule: the audio media element. Plays the audio track's preview file
// through rodio. The playback clock decides when to seek, play and pause;
// this module only does what it is told.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use visoai_core::error::PlaybackDeviceError;
use visoai_core::playback::MediaElement;
use visoai_core::track::TrackKind;

pub struct AudioModule {
    /// Created lazily on the first warm_up(); must outlive every sink.
    stream:        Option<OutputStream>,
    stream_failed: bool,
    sink:          Option<Sink>,
    source:        Option<PathBuf>,
    position:      f64,
    volume:        f32,
}

impl AudioModule {
    pub fn new() -> Self {
        Self {
            stream:        None,
            stream_failed: false,
            sink:          None,
            source:        None,
            position:      0.0,
            volume:        1.0,
        }
    }

    /// Called once per frame. Opens the output device on the first frame
    /// rather than at construction: under the Windows GUI subsystem WASAPI
    /// needs the message loop running, and registers its session
    /// asynchronously, so a sink connected on the same frame is dropped.
    pub fn warm_up(&mut self) {
        if self.stream.is_none() && !self.stream_failed {
            if let Err(e) = self.open_stream() {
                log::warn!("[audio] {e}");
                self.stream_failed = true;
            }
        }
    }

    /// Point the element at a new preview file (or none). Any running sink is dropped.
    pub fn set_source(&mut self, path: Option<PathBuf>) {
        self.stop_sink();
        self.position = 0.0;
        self.source   = path;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    pub fn volume(&self) -> f32 { self.volume }

    fn open_stream(&mut self) -> Result<(), PlaybackDeviceError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| device_error(format!("no output device: {e}")))?;
        stream.log_on_drop(false);
        log::info!("[audio] output stream ready");
        self.stream = Some(stream);
        Ok(())
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

impl Default for AudioModule {
    fn default() -> Self { Self::new() }
}

fn device_error(reason: impl Into<String>) -> PlaybackDeviceError {
    PlaybackDeviceError { kind: TrackKind::Audio, reason: reason.into() }
}

impl MediaElement for AudioModule {
    fn kind(&self) -> TrackKind { TrackKind::Audio }

    fn seek(&mut self, secs: f64) {
        self.position = secs.max(0.0);
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.try_seek(Duration::from_secs_f64(self.position)) {
                log::debug!("[audio] seek to {:.3}s: {e}", self.position);
            }
        }
    }

    fn play(&mut self) -> Result<(), PlaybackDeviceError> {
        // Resume an existing sink in place.
        if let Some(sink) = &self.sink {
            sink.play();
            return Ok(());
        }

        let path = self.source.clone().ok_or_else(|| device_error("no audio source"))?;
        if self.stream.is_none() {
            self.stream_failed = false;
            self.open_stream()?;
        }
        let Some(stream) = &self.stream else {
            return Err(device_error("output stream unavailable"));
        };

        let file = File::open(&path)
            .map_err(|e| device_error(format!("open {}: {e}", path.display())))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| device_error(format!("decode {}: {e}", path.display())))?;

        let sink = Sink::connect_new(&stream.mixer());
        sink.append(decoder);
        if self.position > 0.0 {
            if let Err(e) = sink.try_seek(Duration::from_secs_f64(self.position)) {
                log::warn!("[audio] initial seek to {:.3}s failed: {e}", self.position);
            }
        }
        sink.set_volume(self.volume);
        sink.play();
        log::debug!("[audio] sink playing from {:.3}s", self.position);
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if self.sink.is_some() {
            log::debug!("[audio] sink stopped");
        }
        self.stop_sink();
    }
}
