// romshelf - handheld-style ROM launcher
// Library index, inbox auto-import, navigation and emulator supervision

pub mod config;     // settings and platform table
pub mod error;      // error taxonomy
pub mod events;     // the one channel everything talks through
pub mod ingest;     // inbox watcher + classifier
pub mod library;    // platforms, titles, directory scans
pub mod nav;        // navigation state machine
pub mod session;    // main-context glue: navigator + supervisor
pub mod supervisor; // the single emulator process
#[cfg(feature = "tui")]
pub mod ui;         // terminal interface

// Export the stuff other modules actually use
pub use config::Config;
pub use error::{Error, Result};
pub use events::{AppEvent, EventHandler, EventSender};
pub use ingest::{Classifier, IngestSettings, Ingestor};
pub use library::{LibraryIndex, ListEntry, Platform, Title};
pub use nav::{LibraryView, NavCommand, NavEvent, Navigator};
pub use session::Session;
pub use supervisor::{CommandLauncher, Launcher, Supervisor};
