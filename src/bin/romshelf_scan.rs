// Quick look at what romshelf would show, without starting the TUI
// Handy for checking a config or a freshly copied library

use anyhow::Context;
use clap::Parser;
use romshelf::{ingest::watcher, Classifier, Config, LibraryIndex};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "romshelf-scan")]
#[command(about = "Print the library listing and inbox contents")]
struct Args {
    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    println!("🎮 romshelf library scan");
    println!("========================");
    let index = LibraryIndex::new(&config.library_root);
    println!("📁 Library: {:?}", index.root());
    println!();

    let platforms = config.platforms();

    for platform in &platforms {
        let dir = index.platform_dir(platform);
        match index.try_scan(platform) {
            Ok(titles) if titles.is_empty() => {
                println!("{} ({:?}): no games", platform.name, dir);
            }
            Ok(titles) => {
                println!("✅ {} ({:?}): {} games", platform.name, dir, titles.len());
                for (i, title) in titles.iter().enumerate() {
                    println!("   {}. {}", i + 1, title);
                }
            }
            Err(e) => {
                println!("❌ {}: {}", platform.name, e);
            }
        }
        println!();
    }

    println!("📥 Inbox: {:?}", config.inbox);
    let pending = watcher::sweep(&config.inbox);
    if pending.is_empty() {
        println!("   (empty)");
    }

    let classifier = Classifier::new(platforms);
    for file in &pending {
        let name = file.file_name().unwrap_or("?");
        match classifier.classify(&file.path) {
            Some(platform) => println!("   {} -> {}", name, platform.id),
            None => println!("   {} (unsupported, stays put)", name),
        }
    }

    Ok(())
}
