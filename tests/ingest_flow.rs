// End to end: a ROM dropped into the inbox shows up in the list

use romshelf::{
    AppEvent, CommandLauncher, EventHandler, IngestSettings, Ingestor, LibraryIndex, NavEvent,
    Navigator, Platform, Session, Supervisor,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

fn platforms() -> Vec<Platform> {
    vec![
        Platform::new("nes", "NES", &["nes"]),
        Platform::new("snes", "SNES", &["sfc"]),
    ]
}

fn session(library_root: &Path) -> Session {
    let navigator = Navigator::new(LibraryIndex::new(library_root), platforms()).unwrap();
    let supervisor = Supervisor::new(
        Box::new(CommandLauncher::new("true", Vec::new())),
        Duration::from_millis(100),
    );
    Session::new(navigator, supervisor)
}

async fn wait_for_refresh(events: &mut EventHandler) -> AppEvent {
    timeout(Duration::from_secs(5), async {
        loop {
            match events.next_event().await {
                Some(event @ AppEvent::Refresh(_)) => return event,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("no refresh within 5s")
}

#[tokio::test]
async fn test_dropped_rom_appears_in_current_list() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("downloads");
    let roms = temp.path().join("roms");
    fs::create_dir_all(&roms).unwrap();

    let mut session = session(&roms);
    assert_eq!(session.view().entries, vec!["No games found"]);

    let mut events = EventHandler::new();
    let settings = IngestSettings {
        inbox: inbox.clone(),
        library_root: roms.clone(),
        platforms: platforms(),
        sweep_on_start: false,
    };
    let mut ingestor = Ingestor::spawn(settings, events.sender()).unwrap();

    fs::write(inbox.join("notes.txt"), b"keep me").unwrap();
    fs::write(inbox.join("mario.nes"), b"rom").unwrap();

    let refresh = wait_for_refresh(&mut events).await;
    assert_eq!(refresh, AppEvent::Refresh("nes".to_string()));
    session.handle_event(refresh);

    let view = session.view();
    assert_eq!(view.platform_name, "NES");
    assert_eq!(view.entries, vec!["mario.nes"]);
    assert_eq!(view.selected, 0);

    assert!(roms.join("nes").join("mario.nes").is_file());
    assert!(!inbox.join("mario.nes").exists());
    assert!(inbox.join("notes.txt").is_file());

    ingestor.stop();
    assert!(!ingestor.is_running());
}

#[tokio::test]
async fn test_rom_for_other_platform_shows_after_switch() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("downloads");
    let roms = temp.path().join("roms");

    let mut session = session(&roms);
    let mut events = EventHandler::new();
    let settings = IngestSettings {
        inbox: inbox.clone(),
        library_root: roms.clone(),
        platforms: platforms(),
        sweep_on_start: false,
    };
    let mut ingestor = Ingestor::spawn(settings, events.sender()).unwrap();

    fs::write(inbox.join("zelda.sfc"), b"rom").unwrap();

    let refresh = wait_for_refresh(&mut events).await;
    assert_eq!(refresh, AppEvent::Refresh("snes".to_string()));
    session.handle_event(refresh);

    // Still on NES, list untouched
    assert_eq!(session.view().entries, vec!["No games found"]);

    session.handle_event(AppEvent::Input(NavEvent::SwitchPlatformRight));
    let view = session.view();
    assert_eq!(view.platform_name, "SNES");
    assert_eq!(view.entries, vec!["zelda.sfc"]);

    ingestor.stop();
}
