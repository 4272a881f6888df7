// Emulator process supervision - one running game at a time.
// Everything here runs on the main loop, so no locking. Nothing on the
// input path blocks: terminate() only signals, poll() finishes the job.

pub mod launcher;

pub use launcher::{CommandLauncher, Launcher};

use crate::error::Result;
use crate::library::{Platform, Title};
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The one tracked emulator
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    pub platform_id: String,
    pub title: Title,
    pub started: Instant,
}

impl RunningProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Reported by poll() when the emulator went away on its own
#[derive(Debug)]
pub struct ProcessExit {
    pub title: Title,
    /// None if the status could not be read
    pub status: Option<ExitStatus>,
}

/// A process that got SIGTERM and has until `deadline` to exit
#[derive(Debug)]
struct StoppingProcess {
    process: RunningProcess,
    deadline: Instant,
}

pub struct Supervisor {
    launcher: Box<dyn Launcher>,
    running: Option<RunningProcess>,
    stopping: Option<StoppingProcess>,
    grace: Duration,
}

impl Supervisor {
    pub fn new(launcher: Box<dyn Launcher>, grace: Duration) -> Self {
        Self {
            launcher,
            running: None,
            stopping: None,
            grace,
        }
    }

    /// Starts `title`, stopping whatever was running first.
    /// On failure nothing is tracked - the old process is already on its way out by then.
    pub fn launch(&mut self, platform: &Platform, title: &Title) -> Result<&RunningProcess> {
        self.terminate();

        let child = self.launcher.spawn(platform, title)?;
        info!("🎮 Launched {} ({}) pid={}", title, platform.name, child.id());

        let process = self.running.insert(RunningProcess {
            child,
            platform_id: platform.id.clone(),
            title: title.clone(),
            started: Instant::now(),
        });

        Ok(&*process)
    }

    /// Asks the tracked process to stop and stops tracking it. Returns whether
    /// anything was tracked; calling it with nothing running is fine.
    /// Never waits out the grace period - poll() reaps or kills later.
    pub fn terminate(&mut self) -> bool {
        match self.running.take() {
            Some(process) => {
                self.begin_stop(process);
                true
            }
            None => {
                debug!("Terminate requested with nothing running");
                false
            }
        }
    }

    /// Non-blocking exit check. Clears the handle when the process is gone,
    /// and moves a stopping process along (reap, or kill once its grace is up).
    pub fn poll(&mut self) -> Option<ProcessExit> {
        self.reap_stopping();

        let process = self.running.as_mut()?;

        let status = match process.child.try_wait() {
            Ok(None) => return None,
            Ok(Some(status)) => Some(status),
            Err(e) => {
                warn!("Lost track of {} (pid {}): {}", process.title, process.pid(), e);
                None
            }
        };

        let process = self.running.take()?;
        let played = process.started.elapsed().as_secs();
        let title = match status {
            Some(status) => {
                info!("Emulator for {} exited with {} after {}s", process.title, status, played);
                process.title
            }
            None => {
                info!("Emulator for {} gone after {}s", process.title, played);
                let title = process.title.clone();
                // Status unknown - make sure it is really gone
                force_stop(process);
                title
            }
        };

        Some(ProcessExit { title, status })
    }

    pub fn running(&self) -> Option<&RunningProcess> {
        self.running.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// A terminated process still inside its grace period
    pub fn is_stopping(&self) -> bool {
        self.stopping.is_some()
    }

    /// Blocking stop for the way out: the running process and any stopping one
    /// get their grace period, then SIGKILL.
    pub fn shutdown(&mut self) {
        self.terminate();

        if let Some(stopping) = self.stopping.take() {
            wait_out(stopping);
        }
    }

    fn begin_stop(&mut self, mut process: RunningProcess) {
        // Only one process drains at a time, an older one is killed outright
        if let Some(previous) = self.stopping.take() {
            debug!("{} still stopping, killing it", previous.process.title);
            force_stop(previous.process);
        }

        match process.child.try_wait() {
            Ok(Some(status)) => {
                debug!("{} had already exited ({})", process.title, status);
                return;
            }
            Ok(None) => {}
            Err(e) => warn!("Could not check {} before stopping: {}", process.title, e),
        }

        if send_sigterm(&process) {
            self.stopping = Some(StoppingProcess {
                process,
                deadline: Instant::now() + self.grace,
            });
        } else {
            force_stop(process);
        }
    }

    fn reap_stopping(&mut self) {
        let Some(stopping) = self.stopping.as_mut() else {
            return;
        };

        let escalate = match stopping.process.child.try_wait() {
            Ok(Some(status)) => {
                info!("Stopped {} ({})", stopping.process.title, status);
                false
            }
            Ok(None) if Instant::now() < stopping.deadline => return,
            Ok(None) => {
                debug!("{} ignored SIGTERM, killing", stopping.process.title);
                true
            }
            Err(e) => {
                warn!("Could not check {} while stopping: {}", stopping.process.title, e);
                true
            }
        };

        if let Some(stopping) = self.stopping.take() {
            if escalate {
                force_stop(stopping.process);
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        // No orphaned emulators
        self.shutdown();
    }
}

// SIGTERM first so the emulator can flush saves
#[cfg(unix)]
fn send_sigterm(process: &RunningProcess) -> bool {
    let pid = process.pid() as libc::pid_t;
    // SAFETY: kill(2) with a pid we spawned and have not reaped yet
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn send_sigterm(_process: &RunningProcess) -> bool {
    false
}

/// Blocks until the process exits or its deadline passes, then kills it
fn wait_out(mut stopping: StoppingProcess) {
    while Instant::now() < stopping.deadline {
        match stopping.process.child.try_wait() {
            Ok(Some(status)) => {
                info!("Stopped {} ({})", stopping.process.title, status);
                return;
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
            Err(_) => break,
        }
    }
    force_stop(stopping.process);
}

/// SIGKILL and reap
fn force_stop(mut process: RunningProcess) {
    if let Err(e) = process.child.kill() {
        warn!("Failed to kill {}: {}", process.title, e);
    }
    match process.child.wait() {
        Ok(status) => info!("Stopped {} ({})", process.title, status),
        Err(e) => warn!("Failed to reap {}: {}", process.title, e),
    }
}
