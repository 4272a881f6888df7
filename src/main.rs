// romshelf - pick a system, pick a game, play
// Drops new ROMs from the download folder into the library while you browse

use anyhow::{Context, Result};
use clap::Parser;
use romshelf::{ui::App, Config};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "romshelf")]
#[command(about = "A console-style ROM launcher for the terminal")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the library root from the config
    #[arg(long)]
    library_root: Option<PathBuf>,

    /// Override the inbox (download) directory from the config
    #[arg(long)]
    inbox: Option<PathBuf>,
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "romshelf.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Base filter: info level for general logs, debug for romshelf
    let base_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,romshelf=debug"))
    };

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_filter(base_filter());

    // Dev mode also logs to stderr, in addition to the file
    let stderr_layer = dev.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(base_filter())
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    if dev {
        eprintln!("🔧 Dev mode: Debug output enabled to stderr + file");
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load config - defaults get written on first run
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(root) = args.library_root {
        config.library_root = root;
    }
    if let Some(inbox) = args.inbox {
        config.inbox = inbox;
    }
    config.validate().context("Invalid config after command-line overrides")?;

    // Keep the guard alive until exit so buffered log lines get flushed
    let _guard = init_logging(&config.log_dir(), args.dev).context("Failed to set up logging")?;

    info!(
        "🎮 romshelf starting: library {:?}, inbox {:?}, {} platforms",
        config.library_root,
        config.inbox,
        config.platforms.len()
    );

    let mut app = App::new(config).await?;
    app.run().await?;

    Ok(())
}
