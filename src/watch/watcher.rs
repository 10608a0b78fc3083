// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::info;

use crate::errors::{Result, TreewatchError};
use crate::fs::FileSystem;
use crate::kernel::WatchService;
use crate::types::EventMask;
use crate::watch::path::{self, is_child_of};
use crate::watch::patterns::NameFilter;
use crate::watch::table::{EntryId, WatchTable};

/// Start-up parameters for a [`Watcher`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub root: PathBuf,
    pub recursive: bool,
    pub follow_symlinks: bool,
    pub event_mask: EventMask,
    pub exclude: Option<Regex>,
    pub catch: Option<Regex>,
}

impl WatchOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            follow_symlinks: true,
            event_mask: EventMask::DEFAULT,
            exclude: None,
            catch: None,
        }
    }
}

/// Owns the watch table and everything needed to keep it in sync with the
/// filesystem: the root, the traversal flags and the name filters.
///
/// The traversal and reclamation operations are implemented in
/// `watch::traversal` and `watch::reclaim`.
#[derive(Debug)]
pub struct Watcher<K, F> {
    pub(crate) root: String,
    pub(crate) root_id: EntryId,
    pub(crate) recursive: bool,
    pub(crate) follow_symlinks: bool,
    pub(crate) filter: NameFilter,
    pub(crate) table: WatchTable<K>,
    pub(crate) fs: F,
}

impl<K: WatchService, F: FileSystem> Watcher<K, F> {
    /// Canonicalize the root, register it and install the initial watch set.
    ///
    /// Any failure here is fatal to the caller, including a traversal that
    /// could not list a directory.
    pub fn initialize(options: WatchOptions, kernel: K, fs: F) -> Result<Self> {
        let root = path::canonicalize(&fs, &options.root)?;
        if !fs.is_dir(Path::new(&root)) {
            return Err(TreewatchError::path_unavailable(
                options.root.display().to_string(),
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }

        let mut table = WatchTable::new(kernel, options.event_mask);
        let (root_id, _) = table.register(&root)?;

        let mut watcher = Self {
            root,
            root_id,
            recursive: options.recursive,
            follow_symlinks: options.follow_symlinks,
            filter: NameFilter::new(options.exclude, options.catch),
            table,
            fs,
        };

        let root = watcher.root.clone();
        watcher.watch(&root, None)?;
        info!(
            root = %watcher.root,
            watches = watcher.table.len(),
            recursive = watcher.recursive,
            "initial watch set installed"
        );
        Ok(watcher)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn root_id(&self) -> EntryId {
        self.root_id
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    pub fn table(&self) -> &WatchTable<K> {
        &self.table
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn event_mask(&self) -> EventMask {
        self.table.mask()
    }

    pub fn is_under_root(&self, path: &str) -> bool {
        is_child_of(path, &self.root)
    }
}
