//! Inbox watching
//!
//! Wraps `notify` and boils its events down to the files that just showed up.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::debug;
use walkdir::WalkDir;

use super::PendingFile;
use crate::error::Result;

/// What the ingest worker's queue carries
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    /// Raw watcher output
    Fs(notify::Result<Event>),
    /// Finish the current file, then exit
    Stop,
}

/// Start watching `inbox` (non-recursive), forwarding everything into `tx`.
/// The returned watcher must stay alive for events to keep coming.
pub(crate) fn watch_inbox(inbox: &Path, tx: mpsc::Sender<WorkerMessage>) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        // Receiver only goes away during shutdown
        let _ = tx.send(WorkerMessage::Fs(res));
    })?;

    watcher.watch(inbox, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Files that arrived with this event. Creation and rename-into-inbox count
/// (browsers finish downloads with a rename), everything else is ignored.
pub fn arrivals(event: &Event) -> Vec<PendingFile> {
    let paths: Vec<&PathBuf> = match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.iter().collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.iter().collect(),
        // [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event.paths.last().into_iter().collect(),
        _ => Vec::new(),
    };

    paths
        .into_iter()
        .filter(|path| {
            // Also drops directories reported as CreateKind::Any and files already gone
            let is_file = path.is_file();
            if !is_file {
                debug!("Ignoring non-file arrival: {}", path.display());
            }
            is_file
        })
        .map(|path| PendingFile::new(path.clone()))
        .collect()
}

/// Whatever is already sitting in the inbox
pub fn sweep(inbox: &Path) -> Vec<PendingFile> {
    let mut pending: Vec<PendingFile> = WalkDir::new(inbox)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| PendingFile::new(entry.into_path()))
        .collect();

    pending.sort_by(|a, b| a.path.cmp(&b.path));
    pending
}
