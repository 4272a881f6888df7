use super::{ListEntry, Platform, Title};
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Reads platform directories under the library root.
/// Holds no state of its own - every scan hits the filesystem.
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    root: PathBuf,
}

impl LibraryIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform_dir(&self, platform: &Platform) -> PathBuf {
        self.root.join(&platform.dir)
    }

    /// Sorted titles for a platform, or `[NoGames]` when there is nothing to show.
    /// Read errors are logged and treated as an empty library.
    pub fn scan(&self, platform: &Platform) -> Vec<ListEntry> {
        let titles = match self.try_scan(platform) {
            Ok(titles) => titles,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        };

        if titles.is_empty() {
            return vec![ListEntry::NoGames];
        }

        titles.into_iter().map(ListEntry::Title).collect()
    }

    /// Raw scan. A missing directory is just an empty library, not an error.
    pub fn try_scan(&self, platform: &Platform) -> Result<Vec<Title>> {
        let dir = self.platform_dir(platform);

        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::Scan {
                    path: dir,
                    source: io::Error::other("not a directory"),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No directory for {} yet: {}", platform.name, dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::Scan { path: dir, source: e }),
        }

        let mut titles = Vec::new();

        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Failing on the root means the listing itself is unreadable
                    if e.depth() == 0 {
                        return Err(Error::Scan {
                            path: dir,
                            source: e.into_io_error().unwrap_or_else(|| io::Error::other("walk failed")),
                        });
                    }
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();

            // Skip hidden files (dotfiles, half-finished downloads)
            if path.file_name()
                .and_then(|n| n.to_str())
                .map_or(true, |n| n.starts_with('.')) {
                continue;
            }

            if !platform.accepts(path) {
                continue;
            }

            match Title::new(path.to_path_buf()) {
                Some(title) => titles.push(title),
                None => debug!("Skipping non UTF-8 file name: {}", path.display()),
            }
        }

        // readdir order differs between filesystems
        titles.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        debug!("Scanned {}: {} titles", platform.name, titles.len());
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn nes() -> Platform {
        Platform::new("nes", "NES", &["nes"])
    }

    fn labels(entries: &[ListEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.label()).collect()
    }

    #[test]
    fn test_missing_directory_yields_placeholder() {
        let temp = TempDir::new().unwrap();
        let index = LibraryIndex::new(temp.path().join("roms"));

        assert_eq!(index.scan(&nes()), vec![ListEntry::NoGames]);
        assert!(index.try_scan(&nes()).unwrap().is_empty());

        // Scanning never creates anything
        assert!(!temp.path().join("roms").exists());
    }

    #[test]
    fn test_empty_directory_yields_placeholder() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("nes")).unwrap();
        let index = LibraryIndex::new(temp.path());

        assert_eq!(index.scan(&nes()), vec![ListEntry::NoGames]);
    }

    #[test]
    fn test_titles_are_filtered_and_sorted() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nes");
        fs::create_dir_all(dir.join("saves.nes")).unwrap();
        for name in ["zelda.nes", "Metroid.NES", "mario.nes", "notes.txt", ".hidden.nes"] {
            fs::write(dir.join(name), b"rom").unwrap();
        }

        let index = LibraryIndex::new(temp.path());
        let entries = index.scan(&nes());

        assert_eq!(labels(&entries), vec!["Metroid.NES", "mario.nes", "zelda.nes"]);
        let first = entries[0].title().unwrap();
        assert_eq!(first.path, dir.join("Metroid.NES"));
    }

    #[test]
    fn test_only_matching_platform_files_are_listed() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("snes");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("mario.nes"), b"rom").unwrap();

        let snes = Platform::new("snes", "SNES", &["sfc", "smc"]);
        let index = LibraryIndex::new(temp.path());

        assert_eq!(index.scan(&snes), vec![ListEntry::NoGames]);

        fs::write(dir.join("kirby.smc"), b"rom").unwrap();
        fs::write(dir.join("f-zero.sfc"), b"rom").unwrap();
        assert_eq!(labels(&index.scan(&snes)), vec!["f-zero.sfc", "kirby.smc"]);
    }

    #[test]
    fn test_path_that_is_a_file_is_a_scan_failure() {
        let temp = TempDir::new().unwrap();
        // "nes" exists but is not a directory
        fs::write(temp.path().join("nes"), b"oops").unwrap();
        let index = LibraryIndex::new(temp.path());

        assert!(matches!(index.try_scan(&nes()), Err(Error::Scan { .. })));
        assert_eq!(index.scan(&nes()), vec![ListEntry::NoGames]);
    }
}
