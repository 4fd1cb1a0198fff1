// crates/visoai-media/src/render.rs
//
// The export pipeline: a fixed sequence of ffmpeg invocations that turns the
// two trimmed selections into one merged file.
//
//   trim_video   video_trimmed.mp4   -ss/-t, no audio
//   trim_audio   audio_trimmed.wav   -ss/-t, no video, 44.1 kHz stereo PCM
//   delay_audio  audio_delayed.wav   adelay            (leading_delay > 0)
//   silence      silence.wav         anullsrc          (silence_padding > 0)
//   pad_audio    audio_padded.wav    concat            (silence_padding > 0)
//   merge        merged.mp4          video copy + AAC, cut to the video length
//
// Every intermediate lives in a per-job TempDir. Only the merged file is
// moved out, into the worker's session directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use visoai_core::config::VideoCodecMode;
use visoai_core::error::RenderFailure;
use visoai_core::helpers::time::ffmpeg_secs;
use visoai_core::render_job::RenderRequest;

use crate::cli::FfmpegCli;
use crate::ff_args;

const SAMPLE_RATE: &str = "44100";

#[derive(Clone, Debug, PartialEq)]
pub struct RenderStep {
    pub name:      &'static str,
    pub args:      Vec<OsString>,
    /// Expected output length, used to weight this step's progress.
    pub media_len: f64,
    pub output:    PathBuf,
}

#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub steps:  Vec<RenderStep>,
    pub output: PathBuf,
}

impl RenderPlan {
    pub fn build(req: &RenderRequest, workdir: &Path) -> Self {
        let plan  = req.plan;
        let vlen  = ffmpeg_secs(plan.video_len);
        let mut steps = Vec::with_capacity(6);

        // ── Video ────────────────────────────────────────────────────────────
        let video_out = workdir.join("video_trimmed.mp4");
        let mut args = ff_args!["-ss", ffmpeg_secs(req.video.start), "-i", &req.video.source,
                                "-t", vlen.clone(), "-an"];
        match &req.codec.video {
            VideoCodecMode::Reencode { preset } => args.extend(ff_args![
                "-c:v", "libx264", "-preset", preset.as_str(), "-pix_fmt", "yuv420p",
            ]),
            VideoCodecMode::Copy => args.extend(ff_args!["-c:v", "copy"]),
        }
        args.push(video_out.clone().into_os_string());
        steps.push(RenderStep { name: "trim_video", args, media_len: plan.video_len, output: video_out.clone() });

        // ── Audio ────────────────────────────────────────────────────────────
        let mut audio = workdir.join("audio_trimmed.wav");
        steps.push(RenderStep {
            name: "trim_audio",
            args: ff_args![
                "-ss", ffmpeg_secs(req.audio.start), "-i", &req.audio.source,
                "-t", ffmpeg_secs(plan.audio_len), "-vn",
                "-ac", "2", "-ar", SAMPLE_RATE, "-c:a", "pcm_s16le", &audio,
            ],
            media_len: plan.audio_len,
            output:    audio.clone(),
        });

        if plan.needs_delay() {
            let out = workdir.join("audio_delayed.wav");
            let ms  = (plan.leading_delay * 1000.0).round() as u64;
            steps.push(RenderStep {
                name: "delay_audio",
                args: ff_args!["-i", &audio, "-af", format!("adelay={ms}|{ms}"), "-c:a", "pcm_s16le", &out],
                media_len: plan.leading_delay + plan.audio_len,
                output:    out.clone(),
            });
            audio = out;
        }

        if plan.needs_padding() {
            let silence = workdir.join("silence.wav");
            steps.push(RenderStep {
                name: "silence",
                args: ff_args![
                    "-f", "lavfi", "-i", format!("anullsrc=r={SAMPLE_RATE}:cl=stereo"),
                    "-t", ffmpeg_secs(plan.silence_padding), "-c:a", "pcm_s16le", &silence,
                ],
                media_len: plan.silence_padding,
                output:    silence.clone(),
            });

            let out = workdir.join("audio_padded.wav");
            steps.push(RenderStep {
                name: "pad_audio",
                args: ff_args![
                    "-i", &audio, "-i", &silence,
                    "-filter_complex", "[0:a][1:a]concat=n=2:v=0:a=1[a]",
                    "-map", "[a]", "-c:a", "pcm_s16le", &out,
                ],
                media_len: plan.padded_audio_len(),
                output:    out.clone(),
            });
            audio = out;
        }

        // ── Merge ────────────────────────────────────────────────────────────
        let output = workdir.join("merged.mp4");
        steps.push(RenderStep {
            name: "merge",
            args: ff_args![
                "-i", &video_out, "-i", &audio,
                "-map", "0:v:0", "-map", "1:a:0",
                "-c:v", "copy", "-c:a", "aac", "-b:a", format!("{}k", req.codec.audio_bitrate_kbps),
                "-t", vlen, "-movflags", "+faststart", &output,
            ],
            media_len: plan.video_len,
            output:    output.clone(),
        });

        Self { steps, output }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }
}

/// Folds per-step fractions into one overall fraction, weighting every step
/// by the length of media it produces.
#[derive(Debug)]
pub struct ProgressTracker {
    weights: Vec<f64>,
    total:   f64,
    done:    f64,
    current: usize,
    best:    f64,
}

impl ProgressTracker {
    pub fn new(plan: &RenderPlan) -> Self {
        let weights: Vec<f64> = plan.steps.iter().map(|s| s.media_len.max(0.01)).collect();
        let total = weights.iter().sum::<f64>().max(f64::EPSILON);
        Self { weights, total, done: 0.0, current: 0, best: 0.0 }
    }

    /// Fraction within the current step → overall fraction (never decreasing).
    pub fn update(&mut self, step_fraction: f64) -> f64 {
        let w = self.weights.get(self.current).copied().unwrap_or(0.0);
        let overall = (self.done + w * step_fraction.clamp(0.0, 1.0)) / self.total;
        self.best = self.best.max(overall.min(1.0));
        self.best
    }

    pub fn finish_step(&mut self) {
        if let Some(w) = self.weights.get(self.current) {
            self.done += w;
            self.current += 1;
        }
    }
}

/// Run every step of `req` inside a fresh working directory under
/// `session_dir`. On success the merged file is moved to
/// `session_dir/merged_<job>.mp4` and that path is returned.
pub fn run_render(
    req:         &RenderRequest,
    cli:         &FfmpegCli,
    session_dir: &Path,
    mut on_progress: impl FnMut(f64),
) -> Result<PathBuf, RenderFailure> {
    let workdir = tempfile::Builder::new()
        .prefix("render-")
        .tempdir_in(session_dir)
        .map_err(|e| RenderFailure { step: "prepare".into(), message: e.to_string() })?;

    let plan = RenderPlan::build(req, workdir.path());
    log::info!("[render] job {} steps: {}", req.job_id, plan.step_names().join(" → "));

    let mut tracker = ProgressTracker::new(&plan);
    for step in &plan.steps {
        log::info!("[render] {} → {}", step.name, step.output.display());
        cli.run(step.name, &step.args, step.media_len, |f| on_progress(tracker.update(f)))?;
        tracker.finish_step();
    }

    let dest = session_dir.join(format!("merged_{}.mp4", req.job_id));
    if std::fs::rename(&plan.output, &dest).is_err() {
        std::fs::copy(&plan.output, &dest)
            .map_err(|e| RenderFailure { step: "finalize".into(), message: e.to_string() })?;
    }
    log::info!("[render] job {} → {}", req.job_id, dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use visoai_core::config::CodecSettings;
    use visoai_core::render_job::{ReconcilePlan, TrackSelection};

    fn request(video: (f64, f64), audio: (f64, f64), codec: CodecSettings) -> RenderRequest {
        let video = TrackSelection { source: PathBuf::from("in.mp4"), start: video.0, end: video.1 };
        let audio = TrackSelection { source: PathBuf::from("in.mp3"), start: audio.0, end: audio.1 };
        let plan  = ReconcilePlan::new(&video, &audio);
        RenderRequest { job_id: Uuid::new_v4(), video, audio, plan, codec }
    }

    fn has_pair(step: &RenderStep, a: &str, b: &str) -> bool {
        step.args.windows(2).any(|w| w[0] == a && w[1] == b)
    }

    #[test]
    fn equal_lengths_need_no_delay_or_padding() {
        let req  = request((0.0, 5.0), (0.0, 5.0), CodecSettings::default());
        let plan = RenderPlan::build(&req, Path::new("/w"));
        assert_eq!(plan.step_names(), ["trim_video", "trim_audio", "merge"]);
        assert_eq!(plan.output, PathBuf::from("/w/merged.mp4"));
    }

    #[test]
    fn short_audio_gets_silence_then_concat() {
        let req  = request((0.0, 6.0), (0.0, 4.0), CodecSettings::default());
        let plan = RenderPlan::build(&req, Path::new("/w"));
        assert_eq!(plan.step_names(), ["trim_video", "trim_audio", "silence", "pad_audio", "merge"]);
        assert!(has_pair(&plan.steps[2], "-t", "2.000"));

        let merge = plan.steps.last().unwrap();
        assert!(merge.args.contains(&OsString::from("/w/audio_padded.wav")));
    }

    #[test]
    fn later_audio_start_is_delayed() {
        let req  = request((1.0, 9.0), (3.0, 6.0), CodecSettings::default());
        let plan = RenderPlan::build(&req, Path::new("/w"));
        assert_eq!(
            plan.step_names(),
            ["trim_video", "trim_audio", "delay_audio", "silence", "pad_audio", "merge"],
        );
        assert!(has_pair(&plan.steps[2], "-af", "adelay=2000|2000"));
        // Padding concatenates onto the delayed audio, not the raw trim.
        assert!(plan.steps[4].args.contains(&OsString::from("/w/audio_delayed.wav")));
    }

    #[test]
    fn trims_seek_to_each_selection() {
        let req  = request((2.5, 7.5), (1.0, 4.0), CodecSettings::default());
        let plan = RenderPlan::build(&req, Path::new("/w"));
        assert!(has_pair(&plan.steps[0], "-ss", "2.500"));
        assert!(has_pair(&plan.steps[0], "-t", "5.000"));
        assert!(has_pair(&plan.steps[1], "-ss", "1.000"));
        assert!(has_pair(&plan.steps[1], "-t", "3.000"));
    }

    #[test]
    fn merge_maps_one_stream_each_and_cuts_to_video() {
        let req   = request((0.0, 4.0), (0.0, 10.0), CodecSettings::default());
        let plan  = RenderPlan::build(&req, Path::new("/w"));
        let merge = plan.steps.last().unwrap();
        assert_eq!(merge.name, "merge");
        assert!(has_pair(merge, "-map", "0:v:0"));
        assert!(has_pair(merge, "-map", "1:a:0"));
        assert!(has_pair(merge, "-c:v", "copy"));
        assert!(has_pair(merge, "-c:a", "aac"));
        assert!(has_pair(merge, "-b:a", "192k"));
        assert!(has_pair(merge, "-t", "4.000"));
        assert!(has_pair(merge, "-movflags", "+faststart"));
    }

    #[test]
    fn codec_mode_selects_video_encoder() {
        let copy = CodecSettings { video: VideoCodecMode::Copy, ..CodecSettings::default() };
        let plan = RenderPlan::build(&request((0.0, 3.0), (0.0, 3.0), copy), Path::new("/w"));
        assert!(has_pair(&plan.steps[0], "-c:v", "copy"));

        let plan = RenderPlan::build(&request((0.0, 3.0), (0.0, 3.0), CodecSettings::default()), Path::new("/w"));
        assert!(has_pair(&plan.steps[0], "-c:v", "libx264"));
        assert!(has_pair(&plan.steps[0], "-preset", "veryfast"));
    }

    #[test]
    fn overall_progress_is_monotone_across_steps() {
        let req  = request((0.0, 6.0), (0.0, 4.0), CodecSettings::default());
        let plan = RenderPlan::build(&req, Path::new("/w"));
        let mut tracker = ProgressTracker::new(&plan);

        let mut last = 0.0;
        for _ in &plan.steps {
            for f in [0.0, 0.5, 0.3, 1.0] {
                let overall = tracker.update(f);
                assert!(overall >= last);
                assert!(overall <= 1.0);
                last = overall;
            }
            tracker.finish_step();
        }
        assert!((last - 1.0).abs() < 1e-9);
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir).unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn missing_binary_fails_first_step_and_leaves_nothing() {
        let session = tempfile::tempdir().unwrap();
        let req = request((0.0, 6.0), (0.0, 4.0), CodecSettings::default());
        let cli = FfmpegCli::new(PathBuf::from("/definitely/missing/ffmpeg"));

        let mut calls = 0;
        let err = run_render(&req, &cli, session.path(), |_| calls += 1).unwrap_err();
        assert_eq!(err.step, "trim_video");
        assert!(err.message.contains("could not start"));
        assert_eq!(calls, 0);
        assert!(leftovers(session.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn failed_merge_discards_intermediates() {
        use std::os::unix::fs::PermissionsExt;

        // Writes each step's output (the last argument) and fails on the merge.
        let bin_dir = tempfile::tempdir().unwrap();
        let fake = bin_dir.path().join("ffmpeg");
        std::fs::write(&fake, concat!(
            "#!/bin/sh\n",
            "for a; do out=\"$a\"; done\n",
            "case \"$out\" in *merged.mp4) echo 'Error: muxer exploded' >&2; exit 1;; esac\n",
            ": > \"$out\"\n",
            "echo progress=end\n",
        )).unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let session = tempfile::tempdir().unwrap();
        let req = request((1.0, 9.0), (3.0, 6.0), CodecSettings::default());
        let mut seen = Vec::new();
        let err = run_render(&req, &FfmpegCli::new(fake), session.path(), |f| seen.push(f)).unwrap_err();

        assert_eq!(err.step, "merge");
        assert_eq!(err.message, "Error: muxer exploded");
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(*seen.last().unwrap() < 1.0);
        assert!(leftovers(session.path()).is_empty());
    }
}
