// Auto-import - watches the downloads inbox and files ROMs under the right system.
// Runs on its own thread; the only thing it tells the UI is "platform X changed".

pub mod watcher;

use crate::error::{Error, Result};
use crate::events::{AppEvent, EventSender};
use crate::library::Platform;
use notify::RecommendedWatcher;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use watcher::WorkerMessage;

/// A file seen in the inbox that still needs a home
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
}

impl PendingFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Moved { platform_id: String, dest: PathBuf },
    /// Unknown extension or hidden file - left where it is
    Skipped,
}

/// Extension -> platform lookup
#[derive(Debug, Clone)]
pub struct Classifier {
    platforms: Vec<Platform>,
}

impl Classifier {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Self { platforms }
    }

    pub fn classify(&self, path: &Path) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.accepts(path))
    }
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub inbox: PathBuf,
    pub library_root: PathBuf,
    pub platforms: Vec<Platform>,
    pub sweep_on_start: bool,
}

/// Does the actual classify + rename work. Lives on the worker thread.
pub struct InboxWorker {
    classifier: Classifier,
    library_root: PathBuf,
    notifier: EventSender,
}

impl InboxWorker {
    pub fn new(classifier: Classifier, library_root: PathBuf, notifier: EventSender) -> Self {
        Self {
            classifier,
            library_root,
            notifier,
        }
    }

    /// Moves one file into `library_root/<platform dir>/`. Rename only - never copies,
    /// so a failure leaves the original untouched in the inbox.
    pub fn ingest(&self, pending: &PendingFile) -> Result<IngestOutcome> {
        let hidden = pending.file_name().map_or(true, |n| n.starts_with('.'));
        if hidden {
            debug!("Ignoring hidden inbox file: {}", pending.path.display());
            return Ok(IngestOutcome::Skipped);
        }

        let Some(platform) = self.classifier.classify(&pending.path) else {
            info!("Ignoring unsupported file: {}", pending.path.display());
            return Ok(IngestOutcome::Skipped);
        };

        let dest_dir = self.library_root.join(&platform.dir);
        let relocation_error = |to: &Path, source: io::Error| Error::Relocation {
            from: pending.path.clone(),
            to: to.to_path_buf(),
            source,
        };

        fs::create_dir_all(&dest_dir).map_err(|e| relocation_error(&dest_dir, e))?;

        let file_name = pending
            .path
            .file_name()
            .ok_or_else(|| relocation_error(&dest_dir, io::Error::other("no file name")))?;
        let dest = dest_dir.join(file_name);

        if dest.exists() {
            info!("Replacing existing {}", dest.display());
        }

        fs::rename(&pending.path, &dest).map_err(|e| relocation_error(&dest, e))?;
        info!("Moved {} → {}", pending.path.display(), dest.display());

        Ok(IngestOutcome::Moved {
            platform_id: platform.id.clone(),
            dest,
        })
    }

    /// Ingest and tell the UI. Failures are logged and dropped - no retries.
    pub fn handle(&self, pending: &PendingFile) {
        match self.ingest(pending) {
            Ok(IngestOutcome::Moved { platform_id, .. }) => {
                if self.notifier.send(AppEvent::Refresh(platform_id)).is_err() {
                    debug!("UI already gone, refresh notice dropped");
                }
            }
            Ok(IngestOutcome::Skipped) => {}
            Err(e) => warn!("{}", e),
        }
    }

    fn run(self, rx: mpsc::Receiver<WorkerMessage>, sweep_inbox: Option<PathBuf>) {
        if let Some(inbox) = sweep_inbox {
            let pending = watcher::sweep(&inbox);
            if !pending.is_empty() {
                info!("Found {} file(s) already waiting in {}", pending.len(), inbox.display());
            }
            for file in &pending {
                self.handle(file);
            }
        }

        // One message at a time, so Stop can't cut a move in half
        while let Ok(message) = rx.recv() {
            match message {
                WorkerMessage::Stop => break,
                WorkerMessage::Fs(Ok(event)) => {
                    for file in watcher::arrivals(&event) {
                        self.handle(&file);
                    }
                }
                WorkerMessage::Fs(Err(e)) => warn!("Inbox watcher error: {}", e),
            }
        }

        info!("Ingest worker stopped");
    }
}

/// Handle to the background ingest thread
pub struct Ingestor {
    tx: mpsc::Sender<WorkerMessage>,
    worker: Option<JoinHandle<()>>,
    _watcher: RecommendedWatcher,
}

impl Ingestor {
    pub fn spawn(settings: IngestSettings, notifier: EventSender) -> Result<Self> {
        fs::create_dir_all(&settings.inbox)?;

        let (tx, rx) = mpsc::channel();
        // Watch before sweeping so nothing lands in between unseen
        let watcher = watcher::watch_inbox(&settings.inbox, tx.clone())?;

        let worker = InboxWorker::new(
            Classifier::new(settings.platforms),
            settings.library_root,
            notifier,
        );
        let sweep_inbox = settings.sweep_on_start.then(|| settings.inbox.clone());

        let handle = thread::Builder::new()
            .name("romshelf-ingest".to_string())
            .spawn(move || worker.run(rx, sweep_inbox))?;

        info!("📥 Watching for new ROMs in {}", settings.inbox.display());

        Ok(Self {
            tx,
            worker: Some(handle),
            _watcher: watcher,
        })
    }

    /// Lets the in-flight file finish, then joins the worker. Safe to call twice.
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        let _ = self.tx.send(WorkerMessage::Stop);
        if handle.join().is_err() {
            warn!("Ingest worker panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventHandler;
    use std::time::Duration;
    use tempfile::TempDir;

    fn platforms() -> Vec<Platform> {
        vec![
            Platform::new("nes", "NES", &["nes"]),
            Platform::new("snes", "SNES", &["sfc", "smc"]),
        ]
    }

    struct Fixture {
        _temp: TempDir,
        inbox: PathBuf,
        roms: PathBuf,
        events: EventHandler,
        worker: InboxWorker,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let inbox = temp.path().join("downloads");
        let roms = temp.path().join("roms");
        fs::create_dir_all(&inbox).unwrap();
        let events = EventHandler::new();
        let worker = InboxWorker::new(Classifier::new(platforms()), roms.clone(), events.sender());

        Fixture {
            _temp: temp,
            inbox,
            roms,
            events,
            worker,
        }
    }

    fn drop_file(dir: &Path, name: &str) -> PendingFile {
        let path = dir.join(name);
        fs::write(&path, b"rom data").unwrap();
        PendingFile::new(path)
    }

    #[test]
    fn test_classifier_by_extension() {
        let classifier = Classifier::new(platforms());

        assert_eq!(classifier.classify(Path::new("mario.nes")).map(|p| p.id.as_str()), Some("nes"));
        assert_eq!(classifier.classify(Path::new("Kirby.SMC")).map(|p| p.id.as_str()), Some("snes"));
        assert!(classifier.classify(Path::new("readme.txt")).is_none());
        assert!(classifier.classify(Path::new("noext")).is_none());
    }

    #[test]
    fn test_recognized_file_moves_exactly_once() {
        let mut f = fixture();
        let pending = drop_file(&f.inbox, "mario.nes");

        let outcome = f.worker.ingest(&pending).unwrap();
        let dest = f.roms.join("nes").join("mario.nes");
        assert_eq!(
            outcome,
            IngestOutcome::Moved {
                platform_id: "nes".to_string(),
                dest: dest.clone()
            }
        );
        assert!(!pending.path.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"rom data");

        // handle() on the same (now gone) file fails quietly and sends nothing
        f.worker.handle(&pending);
        assert_eq!(f.events.try_next_event(), None);
    }

    #[test]
    fn test_handle_sends_refresh_notice() {
        let mut f = fixture();
        let pending = drop_file(&f.inbox, "zelda.sfc");

        f.worker.handle(&pending);

        assert_eq!(f.events.try_next_event(), Some(AppEvent::Refresh("snes".to_string())));
        assert!(f.roms.join("snes").join("zelda.sfc").exists());
    }

    #[test]
    fn test_unrecognized_file_stays_put() {
        let mut f = fixture();
        let pending = drop_file(&f.inbox, "manual.pdf");

        assert_eq!(f.worker.ingest(&pending).unwrap(), IngestOutcome::Skipped);
        f.worker.handle(&pending);

        assert_eq!(fs::read(&pending.path).unwrap(), b"rom data");
        assert_eq!(f.events.try_next_event(), None);
        assert!(!f.roms.exists());
    }

    #[test]
    fn test_hidden_file_is_skipped() {
        let f = fixture();
        let pending = drop_file(&f.inbox, ".mario.nes");

        assert_eq!(f.worker.ingest(&pending).unwrap(), IngestOutcome::Skipped);
        assert!(pending.path.exists());
    }

    #[test]
    fn test_relocation_failure_leaves_file_in_inbox() {
        let mut f = fixture();
        // platform dir can't be created because a file is in the way
        fs::create_dir_all(&f.roms).unwrap();
        fs::write(f.roms.join("nes"), b"not a dir").unwrap();
        let pending = drop_file(&f.inbox, "mario.nes");

        let err = f.worker.ingest(&pending).unwrap_err();
        assert!(matches!(err, Error::Relocation { .. }));
        assert!(pending.path.exists());

        f.worker.handle(&pending);
        assert_eq!(f.events.try_next_event(), None);
    }

    #[test]
    fn test_existing_destination_is_replaced() {
        let f = fixture();
        fs::create_dir_all(f.roms.join("nes")).unwrap();
        fs::write(f.roms.join("nes").join("mario.nes"), b"old").unwrap();
        let pending = drop_file(&f.inbox, "mario.nes");

        f.worker.ingest(&pending).unwrap();
        assert_eq!(fs::read(f.roms.join("nes").join("mario.nes")).unwrap(), b"rom data");
    }

    fn created(path: &Path) -> WorkerMessage {
        let event = notify::Event::new(notify::EventKind::Create(notify::event::CreateKind::File))
            .add_path(path.to_path_buf());
        WorkerMessage::Fs(Ok(event))
    }

    #[test]
    fn test_stop_finishes_queued_arrivals_and_nothing_after() {
        let mut f = fixture();
        let (tx, rx) = mpsc::channel();

        let before: Vec<String> = (0..5).map(|i| format!("game{}.nes", i)).collect();
        for name in &before {
            tx.send(created(&drop_file(&f.inbox, name).path)).unwrap();
        }
        tx.send(WorkerMessage::Stop).unwrap();
        let late = drop_file(&f.inbox, "late.nes");
        tx.send(created(&late.path)).unwrap();

        let worker = f.worker;
        thread::spawn(move || worker.run(rx, None)).join().unwrap();

        for name in &before {
            assert!(!f.inbox.join(name).exists());
            assert_eq!(fs::read(f.roms.join("nes").join(name)).unwrap(), b"rom data");
            assert_eq!(f.events.try_next_event(), Some(AppEvent::Refresh("nes".to_string())));
        }
        assert_eq!(f.events.try_next_event(), None);

        // queued behind Stop, never touched
        assert_eq!(fs::read(&late.path).unwrap(), b"rom data");
        assert!(!f.roms.join("nes").join("late.nes").exists());
    }

    #[test]
    fn test_stop_mid_sweep_never_leaves_half_moved_files() {
        let temp = TempDir::new().unwrap();
        let inbox = temp.path().join("downloads");
        let roms = temp.path().join("roms");
        fs::create_dir_all(&inbox).unwrap();
        let names: Vec<String> = (0..50).map(|i| format!("game{:02}.nes", i)).collect();
        for name in &names {
            fs::write(inbox.join(name), b"rom data").unwrap();
        }

        let mut events = EventHandler::new();
        let mut ingestor = Ingestor::spawn(
            IngestSettings {
                inbox: inbox.clone(),
                library_root: roms.clone(),
                platforms: platforms(),
                sweep_on_start: true,
            },
            events.sender(),
        )
        .unwrap();
        ingestor.stop();
        assert!(!ingestor.is_running());

        // every file is whole, in exactly one place
        let mut moved = 0;
        for name in &names {
            let in_inbox = inbox.join(name);
            let in_library = roms.join("nes").join(name);
            assert_ne!(in_inbox.exists(), in_library.exists(), "{}", name);
            let path = if in_library.exists() { in_library } else { in_inbox };
            assert_eq!(fs::read(path).unwrap(), b"rom data");
            moved += usize::from(roms.join("nes").join(name).exists());
        }

        // one notice per finished move
        let mut notices = 0;
        while let Some(event) = events.try_next_event() {
            assert_eq!(event, AppEvent::Refresh("nes".to_string()));
            notices += 1;
        }
        assert_eq!(notices, moved);
    }

    #[tokio::test]
    async fn test_sweep_on_start_imports_waiting_files() {
        let temp = TempDir::new().unwrap();
        let inbox = temp.path().join("downloads");
        let roms = temp.path().join("roms");
        fs::create_dir_all(&inbox).unwrap();
        fs::write(inbox.join("mario.nes"), b"rom").unwrap();
        fs::write(inbox.join("notes.txt"), b"hi").unwrap();

        let mut events = EventHandler::new();
        let mut ingestor = Ingestor::spawn(
            IngestSettings {
                inbox: inbox.clone(),
                library_root: roms.clone(),
                platforms: platforms(),
                sweep_on_start: true,
            },
            events.sender(),
        )
        .unwrap();

        let notice = tokio::time::timeout(Duration::from_secs(5), events.next_event())
            .await
            .expect("no refresh notice");
        assert_eq!(notice, Some(AppEvent::Refresh("nes".to_string())));

        ingestor.stop();
        assert!(!ingestor.is_running());
        ingestor.stop();

        assert!(roms.join("nes").join("mario.nes").exists());
        assert!(!inbox.join("mario.nes").exists());
        assert!(inbox.join("notes.txt").exists());
    }
}
