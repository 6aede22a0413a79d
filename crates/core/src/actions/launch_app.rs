//! Launch action: starts a program detached from SoftDeck.
//!
//! Params: `{"path": "...", "args": "...", "working_dir": "..."}`. When the
//! path is not something that can be spawned directly (a bare command only
//! resolvable through shell association), falls back to the shell "open" verb.

use super::{param_str, Action, ActionError};
use crate::config::ActionParams;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Split an argument string shell-style; unbalanced quotes fall back to
/// plain whitespace splitting
pub fn split_args(args: &str) -> Vec<String> {
    shell_words::split(args)
        .unwrap_or_else(|_| args.split_whitespace().map(str::to_string).collect())
}

#[derive(Debug, Default)]
pub struct LaunchAppAction;

impl LaunchAppAction {
    pub fn new() -> Self {
        Self
    }

    fn build_command(path: &str, args: Option<&str>, working_dir: Option<&str>) -> Command {
        let mut command = Command::new(path);
        if let Some(args) = args {
            command.args(split_args(args));
        }
        if let Some(dir) = working_dir.filter(|d| Path::new(d).is_dir()) {
            command.current_dir(dir);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        command
    }
}

impl Action for LaunchAppAction {
    fn execute(&self, params: &ActionParams) -> Result<(), ActionError> {
        let Some(path) = param_str(params, "path") else {
            warn!("launch_app: no path specified");
            return Ok(());
        };
        let args = param_str(params, "args");
        let working_dir = param_str(params, "working_dir");

        match Self::build_command(path, args, working_dir).spawn() {
            Ok(child) => {
                // Dropping the handle neither waits for nor kills the child
                info!("Launched: {} (pid {})", path, child.id());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => match open::that(path) {
                Ok(()) => {
                    info!("Launched via shell open: {}", path);
                    Ok(())
                }
                Err(source) => Err(ActionError::Launch {
                    path: path.to_string(),
                    source,
                }),
            },
            Err(source) => Err(ActionError::Launch {
                path: path.to_string(),
                source,
            }),
        }
    }
}
