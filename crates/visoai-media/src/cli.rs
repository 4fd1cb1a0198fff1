// crates/visoai-media/src/cli.rs
//
// Runs one ffmpeg CLI invocation with `-progress pipe:1`, forwarding the
// step's completion fraction as it goes. Used by the render pipeline and by
// the stored-video strip-audio step.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use visoai_core::error::RenderFailure;

use crate::helpers::paths::{app_ffmpeg_dir, resolve_ffmpeg};
use crate::helpers::progress::{last_meaningful_line, parse_progress_line, ProgressEvent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegCli {
    bin: PathBuf,
}

impl FfmpegCli {
    pub fn new(bin: PathBuf) -> Self { Self { bin } }

    pub fn resolve(explicit: Option<&Path>) -> Self {
        let bin = resolve_ffmpeg(explicit, &app_ffmpeg_dir());
        log::info!("[ffmpeg] using {}", bin.display());
        Self { bin }
    }

    /// Run ffmpeg with `args`. `media_len` is the expected output length used
    /// to turn `out_time` into a fraction for `on_progress`.
    pub fn run(
        &self,
        step:        &str,
        args:        &[OsString],
        media_len:   f64,
        mut on_progress: impl FnMut(f64),
    ) -> Result<(), RenderFailure> {
        let fail = |message: String| RenderFailure { step: step.to_string(), message };

        let mut cmd = Command::new(&self.bin);
        cmd.args(["-hide_banner", "-nostdin", "-y", "-loglevel", "error", "-nostats"])
            .args(["-progress", "pipe:1"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        log::debug!("[ffmpeg] {step}: {} {:?}", self.bin.display(), args);
        let mut child = cmd.spawn()
            .map_err(|e| fail(format!("could not start {}: {e}", self.bin.display())))?;

        // Drain stderr on its own thread so a chatty encoder can't block on a
        // full pipe while we're reading stdout.
        let stderr_thread = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = err.read_to_string(&mut buf);
                buf
            })
        });

        if let Some(out) = child.stdout.take() {
            for line in BufReader::new(out).lines().map_while(Result::ok) {
                match parse_progress_line(&line) {
                    Some(ProgressEvent::OutTime(t)) if media_len > 0.0 => {
                        on_progress((t / media_len).clamp(0.0, 1.0));
                    }
                    Some(ProgressEvent::End) => on_progress(1.0),
                    _ => {}
                }
            }
        }

        let status = child.wait().map_err(|e| fail(format!("wait: {e}")))?;
        let stderr = stderr_thread
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if status.success() {
            on_progress(1.0);
            Ok(())
        } else {
            let message = last_meaningful_line(&stderr)
                .unwrap_or_else(|| format!("ffmpeg exited with {status}"));
            log::error!("[ffmpeg] {step} failed: {message}");
            Err(fail(message))
        }
    }
}

/// Shorthand for building OsString argument lists.
#[macro_export]
macro_rules! ff_args {
    ($($a:expr),* $(,)?) => {
        vec![$(::std::ffi::OsString::from($a)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_step_failure() {
        let cli = FfmpegCli::new(PathBuf::from("/definitely/not/here/ffmpeg"));
        let err = cli.run("trim_video", &ff_args!["-version"], 1.0, |_| {}).unwrap_err();
        assert_eq!(err.step, "trim_video");
        assert!(err.message.contains("could not start"));
    }
}
