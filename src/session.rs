// Main-context state: navigator + supervisor + status line.
// Fed one AppEvent at a time by the UI loop (or a test), never shared across threads.

use crate::config::Config;
use crate::error::Result;
use crate::events::AppEvent;
use crate::library::LibraryIndex;
use crate::nav::{LibraryView, NavCommand, NavEvent, Navigator};
use crate::supervisor::{CommandLauncher, Supervisor};
use tracing::{debug, warn};

pub struct Session {
    navigator: Navigator,
    supervisor: Supervisor,
    status: Option<String>,
    should_quit: bool,
}

impl Session {
    pub fn new(navigator: Navigator, supervisor: Supervisor) -> Self {
        Self {
            navigator,
            supervisor,
            status: None,
            should_quit: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let index = LibraryIndex::new(&config.library_root);
        let navigator = Navigator::new(index, config.platforms())?;
        let supervisor = Supervisor::new(
            Box::new(CommandLauncher::from_config(&config.launch)),
            config.launch.terminate_grace(),
        );

        Ok(Self::new(navigator, supervisor))
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(nav_event) => {
                let switching = matches!(
                    nav_event,
                    NavEvent::SwitchPlatformLeft | NavEvent::SwitchPlatformRight
                );
                if let Some(command) = self.navigator.handle(nav_event) {
                    self.run_command(command);
                } else if switching {
                    self.status = None;
                }
            }
            AppEvent::Refresh(platform_id) => {
                debug!("Refresh notice for {}", platform_id);
                self.navigator.handle(NavEvent::Refresh(platform_id));
            }
            AppEvent::Rescan => {
                self.navigator.rescan_current();
                self.status = Some(format!("Rescanned {}", self.navigator.current_platform().name));
            }
            AppEvent::Tick => self.tick(),
            AppEvent::Render => {}
            AppEvent::Quit => self.should_quit = true,
        }
    }

    fn run_command(&mut self, command: NavCommand) {
        match command {
            NavCommand::Launch { platform, title } => {
                self.status = match self.supervisor.launch(&platform, &title) {
                    Ok(_) => Some(format!("▶ Running {}", title)),
                    Err(e) => {
                        warn!("{}", e);
                        Some(format!("⚠ {}", e))
                    }
                };
            }
            NavCommand::Terminate => {
                let title = self.supervisor.running().map(|p| p.title.to_string());
                if self.supervisor.terminate() {
                    self.status = title.map(|t| format!("⏹ Stopped {}", t));
                }
            }
        }
    }

    /// Cheap per-frame housekeeping
    pub fn tick(&mut self) {
        if let Some(exit) = self.supervisor.poll() {
            self.status = Some(match exit.status {
                Some(status) if status.success() => format!("{} closed", exit.title),
                Some(status) => format!("{} exited ({})", exit.title, status),
                None => format!("{} stopped responding", exit.title),
            });
        }
    }

    pub fn view(&self) -> LibraryView {
        let mut view = self.navigator.view();
        view.status = self.status.clone();
        // Only mark the running game while its own platform is on screen
        let shown = &self.navigator.current_platform().id;
        view.running = self
            .supervisor
            .running()
            .filter(|p| &p.platform_id == shown)
            .map(|p| p.title.to_string());
        view
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Stop whatever is still running, waiting out its grace period. Called on the way out.
    pub fn shutdown(&mut self) {
        self.supervisor.shutdown();
    }
}
