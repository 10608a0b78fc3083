// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! Variants are split into two families:
//! - recoverable ones (a subtree could not be watched), which callers log and
//!   step over;
//! - fatal ones (configuration, a broken notification stream, the OS refusing
//!   to spawn processes), which end the process with a non-zero status.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreewatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("invalid --{option} regular expression: {source}")]
    InvalidPattern {
        option: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error(
        "unable to add a watch for {path}: watch limit reached \
         (see /proc/sys/fs/inotify/max_user_watches)"
    )]
    ResourceExhausted {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("path is no longer available: {path}")]
    PathUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to open directory {path} while traversing")]
    TraversalAborted {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed notification stream: {0}")]
    MalformedNotificationStream(String),

    #[error("notification channel closed")]
    ChannelClosed,

    #[error("unable to read notification queue")]
    ChannelRead(#[source] io::Error),

    #[error("unable to allocate resources to execute the command")]
    ExecResourceExhausted(#[source] io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TreewatchError {
    /// Errors that only cost us one subtree; monitoring carries on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TreewatchError::ResourceExhausted { .. }
                | TreewatchError::PathUnavailable { .. }
                | TreewatchError::TraversalAborted { .. }
        )
    }

    pub(crate) fn path_unavailable(path: impl Into<String>, source: io::Error) -> Self {
        TreewatchError::PathUnavailable {
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TreewatchError>;
