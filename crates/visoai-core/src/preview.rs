// crates/visoai-core/src/preview.rs
//
// Session-scoped handles to locally readable media files.
//
// A PreviewUrl is move-only: whoever holds it owns the allocation and the only
// way to give it back is `PreviewRegistry::release(url)`, which consumes it.
// Owned entries (session temp files: stored-video downloads, demuxed copies,
// render outputs) are deleted from disk on release. Borrowed entries (files the
// user picked) are only forgotten.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreviewUrl(u64);

impl PreviewUrl {
    pub fn id(&self) -> u64 { self.0 }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview://{}", self.0)
    }
}

#[derive(Debug)]
struct Entry {
    path:  PathBuf,
    owned: bool,
}

#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next:     u64,
    live:     HashMap<u64, Entry>,
    released: u64,
}

impl PreviewRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn allocate(&mut self, path: PathBuf, owned: bool) -> PreviewUrl {
        self.next += 1;
        let id = self.next;
        log::debug!("[preview] allocate preview://{id} → {} (owned={owned})", path.display());
        self.live.insert(id, Entry { path, owned });
        PreviewUrl(id)
    }

    pub fn resolve(&self, url: &PreviewUrl) -> Option<&Path> {
        self.live.get(&url.0).map(|e| e.path.as_path())
    }

    /// Give an allocation back. Returns false if the registry did not know the
    /// URL (it belonged to another registry or was already torn down).
    pub fn release(&mut self, url: PreviewUrl) -> bool {
        match self.live.remove(&url.0) {
            Some(entry) => {
                self.released += 1;
                if entry.owned {
                    if let Err(e) = std::fs::remove_file(&entry.path) {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            log::warn!("[preview] could not delete {}: {e}", entry.path.display());
                        }
                    }
                }
                log::debug!("[preview] released {url}");
                true
            }
            None => {
                log::warn!("[preview] release of unknown {url}");
                false
            }
        }
    }

    /// Release everything still live. Used on editor teardown.
    pub fn release_all(&mut self) -> usize {
        let ids: Vec<u64> = self.live.keys().copied().collect();
        let n = ids.len();
        for id in ids {
            self.release(PreviewUrl(id));
        }
        n
    }

    pub fn live_count(&self)    -> usize { self.live.len() }
    pub fn release_count(&self) -> u64   { self.released }
}

impl Drop for PreviewRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file() -> PathBuf {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"media").unwrap();
        let (_, path) = f.keep().unwrap();
        path
    }

    #[test]
    fn owned_file_is_deleted_on_release() {
        let path = temp_file();
        let mut reg = PreviewRegistry::new();
        let url = reg.allocate(path.clone(), true);
        assert_eq!(reg.resolve(&url), Some(path.as_path()));
        assert!(reg.release(url));
        assert!(!path.exists());
        assert_eq!(reg.live_count(), 0);
        assert_eq!(reg.release_count(), 1);
    }

    #[test]
    fn borrowed_file_survives_release() {
        let path = temp_file();
        let mut reg = PreviewRegistry::new();
        let url = reg.allocate(path.clone(), false);
        reg.release(url);
        assert!(path.exists());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn urls_are_unique() {
        let mut reg = PreviewRegistry::new();
        let a = reg.allocate(PathBuf::from("a.mp4"), false);
        let b = reg.allocate(PathBuf::from("a.mp4"), false);
        assert_ne!(a, b);
        assert_eq!(reg.live_count(), 2);
    }

    #[test]
    fn foreign_url_is_not_released() {
        let mut a = PreviewRegistry::new();
        let mut b = PreviewRegistry::new();
        let url = a.allocate(PathBuf::from("x.mp3"), false);
        b.allocate(PathBuf::from("y.mp3"), false);
        b.allocate(PathBuf::from("z.mp3"), false);
        // preview://1 exists in both; give b an id it never issued.
        let foreign = PreviewUrl(url.id() + 10);
        assert!(!b.release(foreign));
        assert!(a.release(url));
    }

    #[test]
    fn drop_releases_owned_files() {
        let path = temp_file();
        {
            let mut reg = PreviewRegistry::new();
            let _url = reg.allocate(path.clone(), true);
        }
        assert!(!path.exists());
    }
}
