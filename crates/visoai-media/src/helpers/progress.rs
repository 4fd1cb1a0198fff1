// crates/visoai-media/src/helpers/progress.rs
//
// Parsing for ffmpeg's `-progress pipe:1` key=value stream and its stderr.

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Output timestamp reached so far, in seconds.
    OutTime(f64),
    /// `progress=end`: the step has written its last packet.
    End,
}

/// Parse one line of `-progress` output. Unknown keys and `N/A` yield None.
///
/// `out_time_ms` is in microseconds despite its name, same as `out_time_us`.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let (key, value) = line.trim().split_once('=')?;
    let value = value.trim();
    match key.trim() {
        "out_time_us" | "out_time_ms" => value.parse::<i64>().ok()
            .filter(|us| *us >= 0)
            .map(|us| ProgressEvent::OutTime(us as f64 / 1_000_000.0)),
        "out_time" => parse_clock(value).map(ProgressEvent::OutTime),
        "progress" if value == "end" => Some(ProgressEvent::End),
        _ => None,
    }
}

/// `HH:MM:SS.micros` → seconds.
fn parse_clock(s: &str) -> Option<f64> {
    let mut parts = s.split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let sec: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || h < 0.0 || m < 0.0 || sec < 0.0 {
        return None;
    }
    Some(h * 3600.0 + m * 60.0 + sec)
}

/// The last stderr line worth showing to a user.
pub fn last_meaningful_line(stderr: &str) -> Option<String> {
    stderr.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !l.starts_with("frame=") && !l.starts_with("size="))
        .filter(|l| !l.contains("Conversion failed!"))
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_keys() {
        assert_eq!(parse_progress_line("out_time_us=1500000"), Some(ProgressEvent::OutTime(1.5)));
        assert_eq!(parse_progress_line("out_time_ms=250000"),  Some(ProgressEvent::OutTime(0.25)));
        assert_eq!(parse_progress_line("out_time=00:01:02.500000"), Some(ProgressEvent::OutTime(62.5)));
        assert_eq!(parse_progress_line("progress=end"), Some(ProgressEvent::End));
    }

    #[test]
    fn ignores_noise() {
        for l in ["out_time_us=N/A", "out_time=N/A", "progress=continue", "bitrate=  0.0kbits/s",
                  "", "garbage", "out_time_us=-5"] {
            assert_eq!(parse_progress_line(l), None, "{l:?}");
        }
    }

    #[test]
    fn picks_the_real_error_line() {
        let stderr = "Input #0, mov,mp4\n  Duration: 00:00:06.00\n\
                      [aac @ 0x1] Too many bits per frame requested\n\
                      Conversion failed!\n\n";
        assert_eq!(
            last_meaningful_line(stderr).as_deref(),
            Some("[aac @ 0x1] Too many bits per frame requested"),
        );
        assert_eq!(last_meaningful_line("  \n"), None);
    }
}
