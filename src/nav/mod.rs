// Browse state machine - which system is showing, what's in it, where the cursor is.
// Transitions only touch the filesystem through LibraryIndex::scan, launching is
// handed back to the caller as a NavCommand.

use crate::error::Error;
use crate::library::{LibraryIndex, ListEntry, Platform, Title};
use tracing::debug;

/// Logical input - the input backends decide which keys/buttons produce these
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    NavigateUp,
    NavigateDown,
    SwitchPlatformLeft,
    SwitchPlatformRight,
    Activate,
    Cancel,
    /// Something landed in this platform's directory
    Refresh(String),
}

/// Side effects the navigator wants, carried out by whoever owns the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    Launch { platform: Platform, title: Title },
    Terminate,
}

/// Everything a frame needs. `entries` is never empty and `selected` always indexes into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryView {
    pub platform_name: String,
    pub platform_index: usize,
    pub platform_count: usize,
    pub entries: Vec<String>,
    pub selected: usize,
    pub status: Option<String>,
    pub running: Option<String>,
}

pub struct Navigator {
    index: LibraryIndex,
    platforms: Vec<Platform>,
    // listing of the current platform only, every switch rescans
    entries: Vec<ListEntry>,
    platform_idx: usize,
    selected: usize,
}

impl Navigator {
    pub fn new(index: LibraryIndex, platforms: Vec<Platform>) -> Result<Self, Error> {
        if platforms.is_empty() {
            return Err(Error::Config("navigator needs at least one platform".to_string()));
        }

        let mut navigator = Self {
            index,
            platforms,
            entries: vec![ListEntry::NoGames],
            platform_idx: 0,
            selected: 0,
        };
        navigator.rescan_current();

        Ok(navigator)
    }

    pub fn handle(&mut self, event: NavEvent) -> Option<NavCommand> {
        match event {
            NavEvent::NavigateDown => {
                let len = self.entries().len();
                self.selected = (self.selected + 1) % len;
                None
            }
            NavEvent::NavigateUp => {
                let len = self.entries().len();
                self.selected = (self.selected + len - 1) % len;
                None
            }
            NavEvent::SwitchPlatformRight => {
                let count = self.platforms.len();
                self.switch_to((self.platform_idx + 1) % count);
                None
            }
            NavEvent::SwitchPlatformLeft => {
                let count = self.platforms.len();
                self.switch_to((self.platform_idx + count - 1) % count);
                None
            }
            NavEvent::Activate => self.selected_entry().title().map(|title| NavCommand::Launch {
                platform: self.current_platform().clone(),
                title: title.clone(),
            }),
            NavEvent::Cancel => Some(NavCommand::Terminate),
            NavEvent::Refresh(platform_id) => {
                self.refresh(&platform_id);
                None
            }
        }
    }

    /// Re-read the current platform and pull the cursor back in bounds if the list shrank
    pub fn rescan_current(&mut self) {
        let platform = &self.platforms[self.platform_idx];
        self.entries = self.index.scan(platform);

        if self.selected >= self.entries().len() {
            self.selected = 0;
        }
    }

    fn refresh(&mut self, platform_id: &str) {
        match self.platforms.iter().position(|p| p.id == platform_id) {
            Some(idx) if idx == self.platform_idx => self.rescan_current(),
            // Not on screen - the next switch rescans anyway
            Some(_) => debug!("Refresh for {} deferred until it is shown", platform_id),
            None => debug!("Refresh for unknown platform '{}' ignored", platform_id),
        }
    }

    fn switch_to(&mut self, idx: usize) {
        self.platform_idx = idx;
        self.selected = 0;
        self.rescan_current();
        debug!("Switched to {}", self.current_platform().name);
    }

    pub fn current_platform(&self) -> &Platform {
        &self.platforms[self.platform_idx]
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> &ListEntry {
        &self.entries()[self.selected]
    }

    pub fn view(&self) -> LibraryView {
        LibraryView {
            platform_name: self.current_platform().name.clone(),
            platform_index: self.platform_idx,
            platform_count: self.platforms.len(),
            entries: self.entries().iter().map(|e| e.label().to_string()).collect(),
            selected: self.selected,
            status: None,
            running: None,
        }
    }
}
