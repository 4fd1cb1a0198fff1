// crates/visoai-ui/src/helpers/log.rs
//
// Logger setup for the binary. Core and media log through the `log` facade;
// this installs env_logger behind it.
//
// Release builds run under `windows_subsystem = "windows"` with no console,
// so output goes to %TEMP%\visoai.log instead of stderr.

use std::io::Write;

use env_logger::{Builder, Env, Target};

pub const LOG_FILE_NAME: &str = "visoai.log";

/// Default level `info`, overridable with `RUST_LOG`. Safe to call once.
pub fn init_logging() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        writeln!(buf, "[{ts}] {:<5} {}", record.level(), record.args())
    });

    if !cfg!(debug_assertions) {
        let path = std::env::temp_dir().join(LOG_FILE_NAME);
        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => { builder.target(Target::Pipe(Box::new(file))); }
            Err(e)   => eprintln!("[log] cannot open {}: {e}", path.display()),
        }
    }

    // A second init (tests, re-entry) is harmless.
    let _ = builder.try_init();
}
