// crates/visoai-media/src/helpers/paths.rs
//
// Where the editor looks for an ffmpeg binary it can shell out to.

use std::path::{Path, PathBuf};

#[cfg(target_os = "windows")]
const FFMPEG_EXE: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const FFMPEG_EXE: &str = "ffmpeg";

/// `%APPDATA%\VisoAI\ffmpeg` on Windows, `~/.local/share/visoai/ffmpeg` elsewhere.
pub fn app_ffmpeg_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let base = std::env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("VisoAI");
    #[cfg(not(target_os = "windows"))]
    let base = std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(".local").join("share"))
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("visoai");
    base.join("ffmpeg")
}

/// Resolution order: explicit path (config / `VISOAI_FFMPEG`), the app data
/// dir, then bare `ffmpeg` for a PATH lookup.
pub fn resolve_ffmpeg(explicit: Option<&Path>, app_dir: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let bundled = app_dir.join(FFMPEG_EXE);
    if bundled.is_file() {
        return bundled;
    }
    PathBuf::from(FFMPEG_EXE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let p   = resolve_ffmpeg(Some(Path::new("/opt/ff/ffmpeg")), dir.path());
        assert_eq!(p, PathBuf::from("/opt/ff/ffmpeg"));
    }

    #[test]
    fn bundled_binary_before_path_lookup() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_ffmpeg(None, dir.path()), PathBuf::from(FFMPEG_EXE));

        std::fs::write(dir.path().join(FFMPEG_EXE), b"").unwrap();
        assert_eq!(resolve_ffmpeg(None, dir.path()), dir.path().join(FFMPEG_EXE));
    }
}
