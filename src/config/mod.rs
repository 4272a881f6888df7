// Configuration management for romshelf
// Handles loading/saving settings, with sensible defaults when config is missing

use crate::error::Error;
use crate::library::{normalize_extension, Platform};
use anyhow::Result;
use dirs::{config_dir, data_dir};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library_root: PathBuf,
    pub inbox: PathBuf,
    pub platforms: Vec<PlatformConfig>,
    pub launch: LaunchConfig,
    pub ingest: IngestConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub id: String,
    pub name: String,
    pub extensions: Vec<String>,
    /// Defaults to `id` when left out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Placeholders: {rom} {core} {platform} {title}
    /// e.g. program = "retroarch", args = ["-L", "{core}", "{rom}"]
    pub program: String,
    pub args: Vec<String>,
    pub terminate_grace_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub enabled: bool,
    pub sweep_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub show_hints: bool,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("romshelf");

        Self {
            library_root: base_dir.join("roms"),
            inbox: base_dir.join("downloads"),
            platforms: default_platforms(),
            launch: LaunchConfig::default(),
            ingest: IngestConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        // Dev mode - just echo. Point this at retroarch on the real handheld.
        Self {
            program: "echo".to_string(),
            args: vec![
                "Launching".to_string(),
                "{platform}:".to_string(),
                "{rom}".to_string(),
            ],
            terminate_grace_ms: 500,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_on_start: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            show_hints: true,
        }
    }
}

fn default_platforms() -> Vec<PlatformConfig> {
    let platform = |id: &str, name: &str, extensions: &[&str], core: &str| PlatformConfig {
        id: id.to_string(),
        name: name.to_string(),
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
        dir: None,
        core: Some(core.to_string()),
    };

    vec![
        platform("nes", "NES", &["nes"], "/usr/lib/libretro/nestopia_libretro.so"),
        platform("snes", "SNES", &["sfc", "smc"], "/usr/lib/libretro/snes9x_libretro.so"),
        platform("gba", "GBA", &["gba"], "/usr/lib/libretro/mgba_libretro.so"),
    ]
}

impl LaunchConfig {
    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }
}

impl UiConfig {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads from an explicit path, writing defaults there if nothing exists yet
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("romshelf");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the rolling log files go - next to the library, not in the config dir
    pub fn log_dir(&self) -> PathBuf {
        self.library_root
            .parent()
            .map(|p| p.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    /// Platform ids must be unique and every extension maps to exactly one platform,
    /// otherwise the ingestor could not decide where a file belongs.
    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.platforms.is_empty() {
            return Err(Error::Config("no platforms configured".to_string()));
        }

        let mut ids = HashSet::new();
        let mut owners: HashMap<String, &str> = HashMap::new();

        for platform in &self.platforms {
            if platform.id.trim().is_empty() {
                return Err(Error::Config(format!("platform '{}' has an empty id", platform.name)));
            }
            if !ids.insert(platform.id.as_str()) {
                return Err(Error::Config(format!("duplicate platform id '{}'", platform.id)));
            }
            if platform.extensions.is_empty() {
                return Err(Error::Config(format!("platform '{}' has no extensions", platform.id)));
            }

            for ext in &platform.extensions {
                let ext = normalize_extension(ext);
                if ext.is_empty() {
                    return Err(Error::Config(format!("platform '{}' has an empty extension", platform.id)));
                }
                if let Some(owner) = owners.insert(ext.clone(), platform.id.as_str()) {
                    if owner != platform.id {
                        return Err(Error::Config(format!(
                            "extension '.{}' claimed by both '{}' and '{}'",
                            ext, owner, platform.id
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// The fixed platform table, in display order
    pub fn platforms(&self) -> Vec<Platform> {
        self.platforms
            .iter()
            .map(|p| {
                let extensions: Vec<&str> = p.extensions.iter().map(String::as_str).collect();
                let mut platform = Platform::new(p.id.as_str(), p.name.as_str(), &extensions);
                if let Some(dir) = &p.dir {
                    platform = platform.with_dir(dir);
                }
                if let Some(core) = &p.core {
                    platform = platform.with_core(core.as_str());
                }
                platform
            })
            .collect()
    }
}
