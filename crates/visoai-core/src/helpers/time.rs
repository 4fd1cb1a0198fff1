// crates/visoai-core/src/helpers/time.rs
//
// Human-readable timestamps for the transport readout and track labels.

/// Format seconds as `MM:SS:FF` (minutes, seconds, frames at 30 fps).
///
/// Used by the transport readout where frame-level precision matters.
/// Negative and non-finite input reads as zero.
///
/// ```
/// use visoai_core::helpers::time::format_time;
/// assert_eq!(format_time(0.0),    "00:00:00");
/// assert_eq!(format_time(61.5),   "01:01:15");
/// assert_eq!(format_time(3599.0), "59:59:00");
/// assert_eq!(format_time(f64::NAN), "00:00:00");
/// ```
pub fn format_time(s: f64) -> String {
    let s  = if s.is_finite() { s.max(0.0) } else { 0.0 };
    let m  = (s / 60.0) as u32;
    let sc = (s % 60.0) as u32;
    let fr = ((s * 30.0) as u32) % 30;
    format!("{m:02}:{sc:02}:{fr:02}")
}

/// Compact duration for track and library labels.
///
/// | Range         | Format       | Example   |
/// |---------------|--------------|-----------|
/// | ≥ 3600 s      | `H:MM:SS`    | `1:04:35` |
/// | ≥ 60 s        | `M:SS`       | `3:07`    |
/// | < 60 s        | `S.Xs`       | `4.2s`    |
///
/// ```
/// use visoai_core::helpers::time::format_duration;
/// assert_eq!(format_duration(4.2),    "4.2s");
/// assert_eq!(format_duration(187.0),  "3:07");
/// assert_eq!(format_duration(3875.0), "1:04:35");
/// ```
pub fn format_duration(secs: f64) -> String {
    if secs >= 3600.0 {
        format!(
            "{}:{:02}:{:02}",
            secs as u64 / 3600,
            (secs as u64 % 3600) / 60,
            secs as u64 % 60,
        )
    } else if secs >= 60.0 {
        format!("{}:{:02}", secs as u64 / 60, secs as u64 % 60)
    } else {
        format!("{secs:.1}s")
    }
}

/// Seconds as an ffmpeg `-ss` / `-t` argument, millisecond precision.
///
/// ```
/// use visoai_core::helpers::time::ffmpeg_secs;
/// assert_eq!(ffmpeg_secs(2.0),      "2.000");
/// assert_eq!(ffmpeg_secs(1.23456),  "1.235");
/// assert_eq!(ffmpeg_secs(-1.0),     "0.000");
/// ```
pub fn ffmpeg_secs(s: f64) -> String {
    format!("{:.3}", if s.is_finite() { s.max(0.0) } else { 0.0 })
}
