//! Emulator command building.
//!
//! The concrete command line lives in config, e.g. for RetroArch on the handheld:
//!
//! ```toml
//! [launch]
//! program = "retroarch"
//! args = ["-L", "{core}", "{rom}"]
//! ```

use std::ffi::OsString;
use std::process::{Child, Command, Stdio};

use crate::config::LaunchConfig;
use crate::error::{Error, Result};
use crate::library::{Platform, Title};

/// Starts the external process for a title. Swappable so tests (or a
/// different handheld image) can launch something else entirely.
pub trait Launcher: Send {
    fn spawn(&self, platform: &Platform, title: &Title) -> Result<Child>;
}

/// Template-driven launcher. Placeholders in `args`:
/// `{rom}` full ROM path, `{core}` the platform's core, `{platform}` display name,
/// `{title}` ROM file name.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &LaunchConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub fn build_command(&self, platform: &Platform, title: &Title) -> Result<Command> {
        let mut cmd = Command::new(&self.program);

        for arg in &self.args {
            cmd.arg(expand_arg(arg, platform, title)?);
        }

        // The TUI owns the terminal
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        Ok(cmd)
    }
}

impl Launcher for CommandLauncher {
    fn spawn(&self, platform: &Platform, title: &Title) -> Result<Child> {
        let mut cmd = self.build_command(platform, title)?;
        cmd.spawn().map_err(|e| Error::Launch {
            title: title.file_name.clone(),
            reason: format!("{}: {}", self.program, e),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Placeholder {
    Rom,
    Core,
    Platform,
    Title,
}

const PLACEHOLDERS: [(&str, Placeholder); 4] = [
    ("{rom}", Placeholder::Rom),
    ("{core}", Placeholder::Core),
    ("{platform}", Placeholder::Platform),
    ("{title}", Placeholder::Title),
];

fn expand_arg(arg: &str, platform: &Platform, title: &Title) -> Result<OsString> {
    // Whole-argument {rom} keeps non UTF-8 paths intact
    if arg == "{rom}" {
        return Ok(title.path.clone().into_os_string());
    }

    // Single left-to-right pass over the template. Substituted text is never
    // scanned again, so braces in a ROM name stay literal.
    let mut expanded = String::with_capacity(arg.len());
    let mut rest = arg;

    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let candidate = &rest[open..];

        match PLACEHOLDERS.iter().find(|(token, _)| candidate.starts_with(*token)) {
            Some((token, placeholder)) => {
                expanded.push_str(&placeholder_value(*placeholder, platform, title)?);
                rest = &candidate[token.len()..];
            }
            None => {
                expanded.push('{');
                rest = &candidate[1..];
            }
        }
    }
    expanded.push_str(rest);

    Ok(OsString::from(expanded))
}

fn placeholder_value(placeholder: Placeholder, platform: &Platform, title: &Title) -> Result<String> {
    match placeholder {
        Placeholder::Rom => Ok(title.path.to_string_lossy().into_owned()),
        Placeholder::Platform => Ok(platform.name.clone()),
        Placeholder::Title => Ok(title.file_name.clone()),
        Placeholder::Core => platform.core.clone().ok_or_else(|| Error::Launch {
            title: title.file_name.clone(),
            reason: format!("no emulator core configured for {}", platform.name),
        }),
    }
}
