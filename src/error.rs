// Error taxonomy for the launcher core
// Nothing in here is fatal once the UI is up - callers log and keep going

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Platform directory exists but could not be listed
    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rename out of the inbox failed (cross-device, permissions, vanished file...)
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Relocation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Emulator process could not be started
    #[error("failed to launch {title}: {reason}")]
    Launch { title: String, reason: String },

    #[error("inbox watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
