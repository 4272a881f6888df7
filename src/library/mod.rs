// Game library - platforms, titles, and the directory-backed index
// The index is just a cache of directory listings, nothing is persisted

pub mod index;

pub use index::LibraryIndex;

use std::fmt;
use std::path::{Path, PathBuf};

/// Label shown in place of an empty title list
pub const NO_GAMES_LABEL: &str = "No games found";

/// A supported game system. Built once from config, never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Short code, e.g. "nes" - also what refresh notices carry
    pub id: String,
    /// What the header shows, e.g. "NES"
    pub name: String,
    /// Lower-case, no leading dot
    pub extensions: Vec<String>,
    /// Subdirectory under the library root
    pub dir: PathBuf,
    /// Emulator core for the `{core}` launch placeholder
    pub core: Option<String>,
}

impl Platform {
    pub fn new(id: impl Into<String>, name: impl Into<String>, extensions: &[&str]) -> Self {
        let id = id.into();
        Self {
            dir: PathBuf::from(&id),
            id,
            name: name.into(),
            extensions: extensions.iter().map(|ext| normalize_extension(ext)).collect(),
            core: None,
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_core(mut self, core: impl Into<String>) -> Self {
        self.core = Some(core.into());
        self
    }

    pub fn accepts_extension(&self, ext: &str) -> bool {
        let normalized = normalize_extension(ext);
        self.extensions.iter().any(|e| *e == normalized)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.accepts_extension(ext))
    }
}

/// ".SFC" -> "sfc"
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// One ROM file inside a platform directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub file_name: String,
    pub path: PathBuf,
}

impl Title {
    pub fn new(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(Self { file_name, path })
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

/// A row in the browse list. `NoGames` stands in for an empty directory
/// so there is always something to select - it is never launchable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    Title(Title),
    NoGames,
}

impl ListEntry {
    pub fn title(&self) -> Option<&Title> {
        match self {
            ListEntry::Title(title) => Some(title),
            ListEntry::NoGames => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ListEntry::Title(title) => &title.file_name,
            ListEntry::NoGames => NO_GAMES_LABEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_matching_ignores_case_and_dot() {
        let snes = Platform::new("snes", "SNES", &[".sfc", "SMC"]);
        assert_eq!(snes.extensions, vec!["sfc", "smc"]);

        assert!(snes.accepts(Path::new("Super Metroid.SFC")));
        assert!(snes.accepts(Path::new("zelda.smc")));
        assert!(!snes.accepts(Path::new("mario.nes")));
        assert!(!snes.accepts(Path::new("README")));
    }

    #[test]
    fn test_platform_dir_defaults_to_id() {
        let gba = Platform::new("gba", "Game Boy Advance", &["gba"]);
        assert_eq!(gba.dir, PathBuf::from("gba"));

        let gba = gba.with_dir("gameboy-advance");
        assert_eq!(gba.dir, PathBuf::from("gameboy-advance"));
    }

    #[test]
    fn test_placeholder_is_not_a_title() {
        assert!(ListEntry::NoGames.title().is_none());
        assert_eq!(ListEntry::NoGames.label(), "No games found");

        let title = Title::new(PathBuf::from("/roms/nes/mario.nes")).unwrap();
        let entry = ListEntry::Title(title.clone());
        assert_eq!(entry.title(), Some(&title));
        assert_eq!(entry.label(), "mario.nes");
    }
}
