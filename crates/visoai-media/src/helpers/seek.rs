// crates/visoai-media/src/helpers/seek.rs
//
// Soft-failing demuxer seek used by the preview decoder.

use ffmpeg_the_third as ffmpeg;

/// Seek `ictx` to the keyframe at or before `target_secs`.
///
/// Returns false when the demuxer refused; decoding then continues from the
/// current position and the caller's PTS filter drops the pre-roll. A target
/// of 0 skips the seek entirely, since some demuxers reject `max_ts = 0` on a
/// freshly opened context.
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    if !target_secs.is_finite() || target_secs <= 0.0 {
        return true;
    }
    let seek_ts = (target_secs * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("[{label}] seek to {target_secs:.3}s failed ({e}); decoding from current position");
            false
        }
    }
}
