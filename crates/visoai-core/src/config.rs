// crates/visoai-core/src/config.rs
//
// Persisted editor settings. Serialised by the UI through eframe storage;
// environment variables override the stored values at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::trim::DEFAULT_MIN_SPAN;

pub const ENV_BACKEND_URL: &str = "VISOAI_BACKEND_URL";
pub const ENV_TOKEN:       &str = "VISOAI_TOKEN";
pub const ENV_FFMPEG:      &str = "VISOAI_FFMPEG";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodecMode {
    /// Re-encode with libx264 so the cut is frame accurate.
    Reencode { preset: String },
    /// Stream copy. Fast, but cuts snap to the nearest keyframe.
    Copy,
}

impl Default for VideoCodecMode {
    fn default() -> Self {
        VideoCodecMode::Reencode { preset: "veryfast".into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSettings {
    pub video:              VideoCodecMode,
    pub audio_bitrate_kbps: u32,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self { video: VideoCodecMode::default(), audio_bitrate_kbps: 192 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub backend_url:      String,
    /// Sent as `Authorization: Bearer …` when present. Environment only;
    /// never written to storage.
    #[serde(skip)]
    pub token:            Option<String>,
    /// Explicit ffmpeg binary; None means resolve from the app dir or PATH.
    pub ffmpeg_path:      Option<PathBuf>,
    pub download_name:    String,
    pub codec:            CodecSettings,
    pub min_trim_span:    f64,
    /// How often the render worker forwards progress, in milliseconds.
    pub progress_poll_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            backend_url:      "http://127.0.0.1:8000/api".into(),
            token:            None,
            ffmpeg_path:      None,
            download_name:    "merged_video.mp4".into(),
            codec:            CodecSettings::default(),
            min_trim_span:    DEFAULT_MIN_SPAN,
            progress_poll_ms: 250,
        }
    }
}

impl EditorConfig {
    /// Apply `VISOAI_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|k| std::env::var(k).ok())
    }

    pub fn with_overrides_from(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = get(ENV_BACKEND_URL).filter(|s| !s.trim().is_empty()) {
            log::info!("[config] backend url from {ENV_BACKEND_URL}");
            self.backend_url = url.trim().to_string();
        }
        if let Some(tok) = get(ENV_TOKEN).filter(|s| !s.trim().is_empty()) {
            self.token = Some(tok.trim().to_string());
        }
        if let Some(bin) = get(ENV_FFMPEG).filter(|s| !s.trim().is_empty()) {
            self.ffmpeg_path = Some(PathBuf::from(bin.trim()));
        }
        self
    }

    /// `backend_url` joined with a relative endpoint, with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn min_span(&self) -> f64 {
        if self.min_trim_span.is_finite() && self.min_trim_span > 0.0 {
            self.min_trim_span
        } else {
            DEFAULT_MIN_SPAN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_stored_values() {
        let cfg = EditorConfig::default().with_overrides_from(|k| match k {
            ENV_BACKEND_URL => Some("https://api.example.test/v1/".into()),
            ENV_TOKEN       => Some(" abc ".into()),
            _               => None,
        });
        assert_eq!(cfg.backend_url, "https://api.example.test/v1/");
        assert_eq!(cfg.token.as_deref(), Some("abc"));
        assert!(cfg.ffmpeg_path.is_none());
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let cfg = EditorConfig::default().with_overrides_from(|_| Some("  ".into()));
        assert_eq!(cfg, EditorConfig::default());
    }

    #[test]
    fn endpoint_joins_with_one_slash() {
        let mut cfg = EditorConfig::default();
        cfg.backend_url = "http://h/api/".into();
        assert_eq!(cfg.endpoint("/user-videos/"), "http://h/api/user-videos/");
        assert_eq!(cfg.endpoint("delete-video/7/"), "http://h/api/delete-video/7/");
    }

    #[test]
    fn token_is_not_serialized() {
        let cfg = EditorConfig { token: Some("secret".into()), ..EditorConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: EditorConfig = serde_json::from_str(r#"{"download_name":"out.mp4"}"#).unwrap();
        assert_eq!(cfg.download_name, "out.mp4");
        assert_eq!(cfg.codec, CodecSettings::default());
        assert_eq!(cfg.min_span(), DEFAULT_MIN_SPAN);
    }
}
