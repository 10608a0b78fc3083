#![allow(dead_code)]

use std::path::PathBuf;

use regex::Regex;
use treewatch::config::{RawConfigFile, WatchConfig};
use treewatch::types::EventMask;
use treewatch::watch::WatchOptions;

/// Builder for `WatchOptions` to simplify test setup.
///
/// Defaults mirror the command line: not recursive, symlinks followed,
/// default event set, no patterns.
pub struct WatchOptionsBuilder {
    options: WatchOptions,
}

impl WatchOptionsBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            options: WatchOptions::new(root),
        }
    }

    pub fn recursive(mut self) -> Self {
        self.options.recursive = true;
        self
    }

    pub fn no_symlinks(mut self) -> Self {
        self.options.follow_symlinks = false;
        self
    }

    pub fn events(mut self, mask: EventMask) -> Self {
        self.options.event_mask = mask;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.options.exclude = Some(Regex::new(pattern).expect("valid exclude pattern"));
        self
    }

    pub fn catch(mut self, pattern: &str) -> Self {
        self.options.catch = Some(Regex::new(pattern).expect("valid catch pattern"));
        self
    }

    pub fn build(self) -> WatchOptions {
        self.options
    }
}

/// Builder for `RawConfigFile`.
pub struct RawConfigBuilder {
    config: RawConfigFile,
}

impl RawConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn directory(mut self, dir: &str) -> Self {
        self.config.watch.directory = Some(dir.to_string());
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.config.exec.command = Some(cmd.to_string());
        self
    }

    pub fn format(mut self, fmt: &str) -> Self {
        self.config.exec.format = Some(fmt.to_string());
        self
    }

    pub fn events(mut self, events: &[&str]) -> Self {
        self.config.watch.events = Some(events.iter().map(|e| e.to_string()).collect());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude = Some(pattern.to_string());
        self
    }

    pub fn catch(mut self, pattern: &str) -> Self {
        self.config.watch.catch = Some(pattern.to_string());
        self
    }

    pub fn recursive(mut self) -> Self {
        self.config.watch.recursive = true;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> WatchConfig {
        WatchConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for RawConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
