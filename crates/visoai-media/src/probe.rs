// crates/visoai-media/src/probe.rs
//
// In-process FFmpeg probing: is there a decodable stream of the kind we
// need, and how long is the source.

use std::path::Path;

use anyhow::{anyhow, Context as _, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;

use visoai_core::track::TrackKind;

fn media_type(kind: TrackKind) -> Type {
    match kind {
        TrackKind::Video => Type::Video,
        TrackKind::Audio => Type::Audio,
    }
}

/// Duration in seconds of the `kind` stream in `path`.
///
/// Fails if the file can't be opened, has no stream of that kind, the stream
/// has no working decoder, or no positive duration can be found. A video
/// container with an audio stream is a valid audio source.
pub fn probe_duration(path: &Path, kind: TrackKind) -> Result<f64> {
    let ctx = input(path).with_context(|| format!("open {}", path.display()))?;

    let stream = ctx.streams().best(media_type(kind))
        .ok_or_else(|| anyhow!("no {kind} stream"))?;

    let dec = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .context("codec parameters")?
        .decoder();
    match kind {
        TrackKind::Video => { dec.video().context("no video decoder")?; }
        TrackKind::Audio => { dec.audio().context("no audio decoder")?; }
    }

    let container = ctx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    let dur = if container.is_finite() && container > 0.0 {
        container
    } else {
        let tb = stream.time_base();
        if tb.denominator() == 0 {
            0.0
        } else {
            stream.duration() as f64 * tb.numerator() as f64 / tb.denominator() as f64
        }
    };

    if !dur.is_finite() || dur <= 0.0 {
        return Err(anyhow!("duration unknown"));
    }
    log::info!("[media] {kind} duration {dur:.2}s ← {}", path.display());
    Ok(dur)
}

/// Native frame size of the best video stream, if any.
pub fn probe_video_size(path: &Path) -> Option<(u32, u32)> {
    let ctx    = input(path).ok()?;
    let stream = ctx.streams().best(Type::Video)?;
    let dec    = ffmpeg::codec::context::Context::from_parameters(stream.parameters()).ok()?
        .decoder()
        .video()
        .ok()?;
    let (w, h) = (dec.width(), dec.height());
    (w > 0 && h > 0).then_some((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_error() {
        let err = probe_duration(Path::new("/no/such/clip.mp4"), TrackKind::Video).unwrap_err();
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn non_media_file_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(probe_duration(&path, TrackKind::Audio).is_err());
        assert_eq!(probe_video_size(&path), None);
    }
}
