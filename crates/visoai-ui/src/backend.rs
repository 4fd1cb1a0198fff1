// crates/visoai-ui/src/backend.rs
//
// Client for the user-video storage backend.
//
//   GET    {base}/user-videos/          → [{ id, video_data, prompt }]
//   DELETE {base}/delete-video/{id}/
//
// `video_data` is base64 (optionally a `data:` URL). Every request runs on its
// own thread; results come back on `rx` and are drained once per frame.

use std::thread;
use std::time::Duration;

use base64::Engine as _;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Deserialize;

use visoai_core::error::EditorError;

/// Generated videos arrive inline, so the list body can be large.
const MAX_LIST_BYTES: u64 = 1024 * 1024 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StoredVideo {
    pub id:         i64,
    #[serde(default)]
    pub prompt:     String,
    #[serde(default)]
    pub video_data: String,
}

#[derive(Debug)]
pub enum BackendResult {
    Listed(Vec<StoredVideo>),
    /// Payload of a stored video, decoded and ready for the loader.
    Decoded { id: i64, label: String, bytes: Vec<u8> },
    Deleted(i64),
    Failed(EditorError),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<StoredVideo>),
    Wrapped { videos: Vec<StoredVideo> },
}

pub fn parse_video_list(body: &str) -> Result<Vec<StoredVideo>, EditorError> {
    match serde_json::from_str::<ListBody>(body) {
        Ok(ListBody::Bare(v)) | Ok(ListBody::Wrapped { videos: v }) => Ok(v),
        Err(e) => Err(EditorError::Backend(format!("unexpected video list: {e}"))),
    }
}

/// Decode a `video_data` field. Accepts bare base64 or a `data:…;base64,` URL.
pub fn decode_video_data(data: &str) -> Result<Vec<u8>, EditorError> {
    let payload = match data.trim() {
        s if s.starts_with("data:") => s.split_once(',').map(|(_, b)| b).unwrap_or(""),
        s => s,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(EditorError::Backend("stored video has no data".into()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| EditorError::Backend(format!("bad video data: {e}")))
}

fn backend_err(what: &str, e: ureq::Error) -> EditorError {
    EditorError::Backend(format!("{what}: {e}"))
}

pub struct BackendClient {
    agent:  ureq::Agent,
    tx:     Sender<BackendResult>,
    pub rx: Receiver<BackendResult>,
}

impl BackendClient {
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        let (tx, rx) = unbounded();
        Self { agent, tx, rx }
    }

    pub fn list(&self, url: String, token: Option<String>) {
        let agent = self.agent.clone();
        let tx    = self.tx.clone();
        thread::spawn(move || {
            log::info!("[backend] GET {url}");
            let result = (|| {
                let mut req = agent.get(&url);
                if let Some(t) = &token {
                    req = req.header("Authorization", format!("Bearer {t}"));
                }
                let mut resp = req.call().map_err(|e| backend_err("list videos", e))?;
                let body = resp.body_mut()
                    .with_config()
                    .limit(MAX_LIST_BYTES)
                    .read_to_string()
                    .map_err(|e| backend_err("read video list", e))?;
                parse_video_list(&body)
            })();
            let _ = tx.send(match result {
                Ok(videos) => {
                    log::info!("[backend] {} stored videos", videos.len());
                    BackendResult::Listed(videos)
                }
                Err(e) => {
                    log::warn!("[backend] {e}");
                    BackendResult::Failed(e)
                }
            });
        });
    }

    pub fn delete(&self, url: String, token: Option<String>, id: i64) {
        let agent = self.agent.clone();
        let tx    = self.tx.clone();
        thread::spawn(move || {
            log::info!("[backend] DELETE {url}");
            let mut req = agent.delete(&url);
            if let Some(t) = &token {
                req = req.header("Authorization", format!("Bearer {t}"));
            }
            let _ = tx.send(match req.call() {
                Ok(_)  => BackendResult::Deleted(id),
                Err(e) => {
                    let e = backend_err(&format!("delete video {id}"), e);
                    log::warn!("[backend] {e}");
                    BackendResult::Failed(e)
                }
            });
        });
    }

    /// Base64 payloads of generated clips run to tens of megabytes; decode
    /// off the UI thread.
    pub fn decode(&self, video: StoredVideo, label: String) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(match decode_video_data(&video.video_data) {
                Ok(bytes) => BackendResult::Decoded { id: video.id, label, bytes },
                Err(e)    => BackendResult::Failed(e),
            });
        });
    }
}
