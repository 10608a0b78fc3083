// src/exec/command.rs

//! `--command` sink: one detached `sh -c` per accepted event.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::backend::{EventSink, ExecError, TriggeredEvent};
use super::template::{CommandTemplate, TemplateContext};

/// Exit status `sh` uses when the command could not be found or executed.
const EXIT_NOT_EXECUTABLE: i32 = 127;

/// Spawns the rendered command for each event and never waits for it inline.
///
/// Must be used from within a tokio runtime: the exit status of every child
/// is collected by a detached task.
#[derive(Debug)]
pub struct CommandExecutor {
    template: CommandTemplate,
    root: String,
    count: u64,
}

impl CommandExecutor {
    pub fn new(template: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            template: CommandTemplate::new(template),
            root: root.into(),
            count: 0,
        }
    }

    /// Number of commands spawned so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl EventSink for CommandExecutor {
    fn trigger(&mut self, event: &TriggeredEvent) -> Result<(), ExecError> {
        self.count += 1;
        let rendered = self.template.render(&TemplateContext {
            root: &self.root,
            event,
            count: self.count,
        });

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&rendered)
            .stdin(Stdio::null())
            .kill_on_drop(false);

        let mut child = cmd
            .spawn()
            .map_err(|source| ExecError::from_spawn(&rendered, source))?;

        let pid = child.id();
        info!(
            event = event.kind,
            path = %format!("{}{}", event.dir, event.name),
            n = self.count,
            pid,
            command = %rendered,
            "event triggered"
        );

        let n = self.count;
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    debug!(n, pid, "command finished");
                }
                Ok(status) if status.code() == Some(EXIT_NOT_EXECUTABLE) => {
                    warn!(n, pid, command = %rendered, "unable to execute the specified command");
                }
                Ok(status) => {
                    warn!(n, pid, exit_code = ?status.code(), "command failed");
                }
                Err(err) => {
                    warn!(n, pid, error = %err, "waiting for command failed");
                }
            }
        });

        Ok(())
    }
}
