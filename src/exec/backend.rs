// src/exec/backend.rs

//! Pluggable sink for accepted events.
//!
//! The dispatcher talks to an `EventSink` instead of spawning processes
//! itself. Production uses [`CommandExecutor`](super::CommandExecutor) or
//! [`FormatPrinter`](super::FormatPrinter); tests plug in a sink that simply
//! records what it was given.

use std::io;

use thiserror::Error;

/// One event that passed every filter and whose handler succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredEvent {
    /// Event name as printed by `%e` (`create`, `delete`, ...).
    pub kind: &'static str,
    /// Name of the file or directory that triggered the event.
    pub name: String,
    /// Watched directory containing it, slash-terminated.
    pub dir: String,
    /// First capture group of the catch pattern, if any.
    pub capture: Option<String>,
    pub is_dir: bool,
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("unable to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to write event output")]
    Output(#[source] io::Error),

    /// The OS refused to create a process at all.
    #[error("unable to allocate resources to execute the command")]
    ResourceExhausted(#[source] io::Error),
}

impl ExecError {
    /// Whether the watch loop must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecError::ResourceExhausted(_))
    }

    /// Classify a failed spawn: running out of processes or memory is fatal,
    /// anything else only affects this event.
    pub fn from_spawn(command: &str, source: io::Error) -> Self {
        match source.raw_os_error() {
            Some(libc::EAGAIN) | Some(libc::ENOMEM) => ExecError::ResourceExhausted(source),
            _ => ExecError::Spawn {
                command: command.to_string(),
                source,
            },
        }
    }

    pub(crate) fn into_io(self) -> io::Error {
        match self {
            ExecError::Spawn { source, .. }
            | ExecError::Output(source)
            | ExecError::ResourceExhausted(source) => source,
        }
    }
}

/// Trait abstracting what happens to an accepted event.
pub trait EventSink {
    fn trigger(&mut self, event: &TriggeredEvent) -> Result<(), ExecError>;
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn trigger(&mut self, event: &TriggeredEvent) -> Result<(), ExecError> {
        (**self).trigger(event)
    }
}
