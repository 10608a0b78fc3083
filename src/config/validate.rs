// src/config/validate.rs

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use regex::Regex;

use crate::cli::LogLevel;
use crate::config::model::{ExecSection, RawConfigFile, WatchConfig};
use crate::errors::{Result, TreewatchError};
use crate::types::{EventMask, ExecMode};
use crate::watch::WatchOptions;

impl TryFrom<RawConfigFile> for WatchConfig {
    type Error = TreewatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let root = validate_directory(raw.watch.directory.as_deref())?;
        let exec = validate_exec(&raw.exec)?;
        let event_mask = validate_events(raw.watch.events.as_deref())?;
        let exclude = compile_pattern("exclude", raw.watch.exclude.as_deref())?;
        let catch = compile_pattern("regex-catch", raw.watch.catch.as_deref())?;
        let log_level = validate_log_level(raw.log.level.as_deref())?;

        Ok(WatchConfig {
            options: WatchOptions {
                root,
                recursive: raw.watch.recursive,
                follow_symlinks: raw.watch.follow_symlinks,
                event_mask,
                exclude,
                catch,
            },
            exec,
            verbose: raw.log.verbose,
            syslog: raw.log.syslog,
            log_level,
        })
    }
}

fn validate_directory(directory: Option<&str>) -> Result<PathBuf> {
    let Some(directory) = directory.filter(|d| !d.trim().is_empty()) else {
        return Err(TreewatchError::ConfigError(
            "no directory to watch; use -d/--directory or [watch].directory".to_string(),
        ));
    };
    if !Path::new(directory).is_dir() {
        return Err(TreewatchError::ConfigError(format!(
            "'{directory}' is not a directory"
        )));
    }
    Ok(PathBuf::from(directory))
}

fn validate_exec(exec: &ExecSection) -> Result<ExecMode> {
    match (&exec.command, &exec.format) {
        (Some(_), Some(_)) => Err(TreewatchError::ConfigError(
            "--command and --format are mutually exclusive".to_string(),
        )),
        (None, None) => Err(TreewatchError::ConfigError(
            "one of --command or --format is required".to_string(),
        )),
        (Some(command), None) => {
            let command = command.trim();
            if command.is_empty() {
                return Err(TreewatchError::ConfigError(
                    "the command to execute is empty".to_string(),
                ));
            }
            Ok(ExecMode::Command(command.to_string()))
        }
        (None, Some(format)) => Ok(ExecMode::Format(format.clone())),
    }
}

fn validate_events(events: Option<&[String]>) -> Result<EventMask> {
    EventMask::from_names(events.unwrap_or_default()).map_err(TreewatchError::ConfigError)
}

fn compile_pattern(option: &'static str, pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(p).map_err(|source| TreewatchError::InvalidPattern { option, source }))
        .transpose()
}

fn validate_log_level(level: Option<&str>) -> Result<Option<LogLevel>> {
    level
        .map(|l| {
            LogLevel::from_str(l.trim(), true).map_err(|_| {
                TreewatchError::ConfigError(format!(
                    "unknown log level '{l}' (expected error, warn, info, debug or trace)"
                ))
            })
        })
        .transpose()
}
