// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{RawConfigFile, WatchConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] or
/// [`resolve`] to get a usable [`WatchConfig`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WatchConfig> {
    let raw_config = load_from_path(&path)?;
    let config = WatchConfig::try_from(raw_config)?;
    Ok(config)
}

/// Build the effective configuration for a command line: the `--config`
/// file if one was given, with every flag on top.
pub fn resolve(args: &CliArgs) -> Result<WatchConfig> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    apply_cli_overrides(&mut raw, args);
    WatchConfig::try_from(raw)
}

/// Flags win over file values. Boolean flags can only switch a behaviour on
/// (or, for `--no-symlink`, off).
pub fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(directory) = &args.directory {
        raw.watch.directory = Some(directory.clone());
    }
    if args.recursive {
        raw.watch.recursive = true;
    }
    if args.no_symlink {
        raw.watch.follow_symlinks = false;
    }
    if let Some(events) = &args.events {
        raw.watch.events = Some(events.split(',').map(str::to_string).collect());
    }
    if let Some(exclude) = &args.exclude {
        raw.watch.exclude = Some(exclude.clone());
    }
    if let Some(catch) = &args.regex_catch {
        raw.watch.catch = Some(catch.clone());
    }

    // --command and --format replace whatever the file chose.
    if args.command.is_some() || args.format.is_some() {
        raw.exec.command = args.command.clone();
        raw.exec.format = args.format.clone();
    }

    if args.verbose {
        raw.log.verbose = true;
    }
    if args.syslog {
        raw.log.syslog = true;
    }
}
