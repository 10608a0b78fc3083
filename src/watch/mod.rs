// src/watch/mod.rs

//! The watch set and its consistency engine.
//!
//! This module is responsible for:
//! - Keeping one kernel watch per watched directory ([`table`]).
//! - Walking subtrees to install or remove watches, following symbolic links
//!   out of the root when asked to ([`traversal`]).
//! - Releasing directories outside the root once the last link reaching them
//!   is gone ([`reclaim`]).
//!
//! It does **not** decode kernel notifications or run commands; see
//! `engine` and `exec`.

pub mod path;
pub mod patterns;
pub mod reclaim;
pub mod table;
pub mod traversal;
pub mod watcher;

pub use patterns::{CatchOutcome, NameFilter};
pub use table::{EntryId, SymlinkRef, WatchEntry, WatchTable};
pub use watcher::{WatchOptions, Watcher};
