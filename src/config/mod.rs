// src/config/mod.rs

//! Configuration loading and validation for treewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and merge command-line flags (`loader.rs`).
//! - Validate directory, exec mode, events and patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_cli_overrides, load_and_validate, load_from_path, resolve};
pub use model::{ExecSection, LogSection, RawConfigFile, WatchConfig, WatchSection};
