// src/config/model.rs

use serde::Deserialize;

use crate::cli::LogLevel;
use crate::types::ExecMode;
use crate::watch::WatchOptions;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// directory = "/srv/www"
/// recursive = true
/// follow_symlinks = true
/// events = ["create", "delete"]
/// exclude = "node_modules|\\.git"
/// catch = "^(.*)\\.scss$"
///
/// [exec]
/// command = "sass %p%f %p%x.css"
///
/// [log]
/// verbose = true
/// syslog = false
/// level = "debug"
/// ```
///
/// Every section is optional; command-line flags fill in or override fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub exec: ExecSection,

    #[serde(default)]
    pub log: LogSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Root directory to monitor.
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default)]
    pub recursive: bool,

    /// Follow symbolic links to directories (recursive mode only).
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Event names; empty or absent means the default set.
    #[serde(default)]
    pub events: Option<Vec<String>>,

    /// Regex; matching names are neither traversed nor reported.
    #[serde(default)]
    pub exclude: Option<String>,

    /// Regex the name must match for the event to be reported.
    #[serde(default)]
    pub catch: Option<String>,
}

fn default_follow_symlinks() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            directory: None,
            recursive: false,
            follow_symlinks: default_follow_symlinks(),
            events: None,
            exclude: None,
            catch: None,
        }
    }
}

/// `[exec]` section. Exactly one of the two must end up set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecSection {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub format: Option<String>,
}

/// `[log]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub syslog: bool,

    #[serde(default)]
    pub level: Option<String>,
}

/// Validated configuration, ready to start a watcher.
///
/// Constructed via `TryFrom<RawConfigFile>` in `config::validate`.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub options: WatchOptions,
    pub exec: ExecMode,
    pub verbose: bool,
    pub syslog: bool,
    pub log_level: Option<LogLevel>,
}
