// crates/visoai-media/src/loader.rs
//
// Media loader: turns a user-picked file or a stored video's bytes into
// LoadedMedia ready to install in a track slot.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use visoai_core::error::MediaLoadError;
use visoai_core::track::{LoadedMedia, TrackKind};

use crate::cli::FfmpegCli;
use crate::ff_args;
use crate::probe::probe_duration;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Probe a user file for a `kind` stream. The file is borrowed, never deleted.
pub fn load_file(kind: TrackKind, path: &Path) -> Result<LoadedMedia, MediaLoadError> {
    let duration = probe_duration(path, kind)
        .map_err(|e| MediaLoadError::new(kind, format!("{e:#}")))?;
    Ok(LoadedMedia {
        kind,
        path:  path.to_path_buf(),
        duration,
        label: display_name(path),
        owned: false,
    })
}

/// Split a stored video into a video-only copy (for the video track) and the
/// original with its audio (for the audio track). Both files are written to
/// `session_dir` and owned by the session.
pub fn load_stored_video(
    bytes:       &[u8],
    label:       &str,
    session_dir: &Path,
    cli:         &FfmpegCli,
) -> Result<(LoadedMedia, LoadedMedia), MediaLoadError> {
    let stem     = Uuid::new_v4().simple().to_string();
    let original = session_dir.join(format!("stored_{stem}.mp4"));
    let silent   = session_dir.join(format!("stored_{stem}_video.mp4"));

    std::fs::write(&original, bytes)
        .map_err(|e| MediaLoadError::new(TrackKind::Video, format!("write temp file: {e}")))?;

    let audio_dur = probe_duration(&original, TrackKind::Audio)
        .map_err(|e| cleanup(&[&original], MediaLoadError::new(TrackKind::Audio, format!("{e:#}"))))?;

    cli.run("strip_audio", &ff_args!["-i", &original, "-an", "-c:v", "copy", &silent], audio_dur, |_| {})
        .map_err(|f| cleanup(&[&original, &silent], MediaLoadError::new(TrackKind::Video, f.message)))?;

    let video_dur = probe_duration(&silent, TrackKind::Video)
        .map_err(|e| cleanup(&[&original, &silent], MediaLoadError::new(TrackKind::Video, format!("{e:#}"))))?;

    log::info!("[loader] stored video \"{label}\" split → {}", silent.display());
    let video = LoadedMedia {
        kind:     TrackKind::Video,
        path:     silent,
        duration: video_dur,
        label:    label.to_string(),
        owned:    true,
    };
    let audio = LoadedMedia {
        kind:     TrackKind::Audio,
        path:     original,
        duration: audio_dur,
        label:    label.to_string(),
        owned:    true,
    };
    Ok((video, audio))
}

fn cleanup(paths: &[&PathBuf], err: MediaLoadError) -> MediaLoadError {
    for p in paths {
        let _ = std::fs::remove_file(p);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_probe_reports_the_track_kind() {
        let err = load_file(TrackKind::Audio, Path::new("/nope/song.mp3")).unwrap_err();
        assert_eq!(err.kind, TrackKind::Audio);
        assert!(!err.cause.is_empty());
    }

    #[test]
    fn undecodable_stored_video_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let cli = FfmpegCli::new(PathBuf::from("ffmpeg"));
        let err = load_stored_video(b"not a video", "a cat", dir.path(), &cli).unwrap_err();
        assert_eq!(err.kind, TrackKind::Audio);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn label_is_the_file_name() {
        assert_eq!(display_name(Path::new("/clips/intro.mp4")), "intro.mp4");
    }
}
