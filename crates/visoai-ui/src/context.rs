// crates/visoai-ui/src/context.rs
//
// AppContext owns the runtime handles that are not part of the Editor
// aggregate: the media worker, the storage backend client, the stored-video
// list, and the notice queue shown in the top bar.

use visoai_media::MediaWorker;

use crate::backend::{BackendClient, BackendResult, StoredVideo};

/// Oldest notices are dropped past this many.
const MAX_NOTICES: usize = 5;

#[derive(Default)]
pub struct LibraryState {
    pub videos:     Vec<StoredVideo>,
    pub refreshing: bool,
    /// Stored video currently being fetched, decoded or deleted.
    pub busy:       Option<i64>,
    pub fetched:    bool,
}

impl LibraryState {
    pub fn find(&self, id: i64) -> Option<&StoredVideo> {
        self.videos.iter().find(|v| v.id == id)
    }
}

pub struct AppContext {
    pub media_worker:  MediaWorker,
    pub backend:       BackendClient,
    pub library:       LibraryState,
    pub notices:       Vec<String>,
    /// Native size of the loaded video, for the preview aspect ratio.
    pub video_size:    Option<(u32, u32)>,
    /// Load jobs handed to the worker whose result has not arrived yet.
    pub pending_loads: usize,
}

impl AppContext {
    pub fn new(media_worker: MediaWorker) -> Self {
        Self {
            media_worker,
            backend:       BackendClient::new(),
            library:       LibraryState::default(),
            notices:       Vec::new(),
            video_size:    None,
            pending_loads: 0,
        }
    }

    pub fn notify(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::info!("[app] notice: {msg}");
        self.notices.push(msg);
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    pub fn dismiss_notice(&mut self, idx: usize) {
        if idx < self.notices.len() {
            self.notices.remove(idx);
        }
    }

    /// Drain storage backend results. Decoded payloads go straight to the
    /// worker's stored-video loader.
    pub fn ingest_backend_results(&mut self) {
        while let Ok(result) = self.backend.rx.try_recv() {
            match result {
                BackendResult::Listed(videos) => {
                    self.library.videos     = videos;
                    self.library.refreshing = false;
                    self.library.fetched    = true;
                }
                BackendResult::Decoded { id, label, bytes } => {
                    log::info!("[app] stored video {id}: {} bytes", bytes.len());
                    self.library.busy = None;
                    self.pending_loads += 1;
                    self.media_worker.load_stored_video(bytes, label);
                }
                BackendResult::Deleted(id) => {
                    self.library.videos.retain(|v| v.id != id);
                    self.library.busy = None;
                    self.notify(format!("Deleted stored video #{id}"));
                }
                BackendResult::Failed(e) => {
                    // No automatic retry; the refresh button asks again.
                    self.library.fetched    = true;
                    self.library.refreshing = false;
                    self.library.busy       = None;
                    self.notify(e.to_string());
                }
            }
        }
    }
}
