// src/watch/reclaim.rs

//! Releasing directories outside the root once no link reaches them.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::kernel::WatchService;
use crate::watch::path::{is_child_of, parent_dir};
use crate::watch::table::EntryId;
use crate::watch::watcher::Watcher;

impl<K: WatchService, F: FileSystem> Watcher<K, F> {
    /// Forget the symbolic link `link` and release whatever it alone kept
    /// watched. Unknown links are a no-op.
    ///
    /// Returns the canonical paths of the released entries.
    pub fn unwatch_symbolic_link(&mut self, link: &str) -> Vec<String> {
        let mut released = self.detach_link(link);
        released.extend(self.release_unreachable());
        released
    }

    /// Drop `link` and reclaim its owner, without the reachability sweep.
    pub(crate) fn detach_link(&mut self, link: &str) -> Vec<String> {
        let Some(sref) = self.table.symlink(link) else {
            debug!(link, "not a tracked symlink");
            return Vec::new();
        };
        self.table.remove_symlink(sref.owner, link);
        self.reclaim_owner(sref.owner)
    }

    /// Canonical paths of every watched entry reached from the root: the
    /// root's own subtree, plus the subtree of every link target whose link
    /// sits in a reached directory, repeated until nothing changes.
    pub fn reachable_paths(&self) -> BTreeSet<String> {
        let mut reached: BTreeSet<String> = self
            .table
            .entries()
            .filter(|(_, entry)| self.is_under_root(entry.path()))
            .map(|(_, entry)| entry.path().to_string())
            .collect();
        let links = self.table.links_within("/");

        loop {
            let mut grew = false;
            for sref in &links {
                if !parent_dir(&sref.link).is_some_and(|parent| reached.contains(parent)) {
                    continue;
                }
                let Some(owner) = self.table.get(sref.owner) else {
                    continue;
                };
                if reached.contains(owner.path()) {
                    continue;
                }
                for (_, entry) in self.table.subtree(owner.path()) {
                    reached.insert(entry.path().to_string());
                }
                grew = true;
            }
            if !grew {
                return reached;
            }
        }
    }

    /// Release every entry outside the root that no chain of links from the
    /// root reaches any more, and forget links sitting in unreached
    /// directories. Catches cycles such as `/x/me -> /x` that keep a
    /// directory referenced after its last outside link is gone.
    pub(crate) fn release_unreachable(&mut self) -> Vec<String> {
        let reached = self.reachable_paths();

        for sref in self.table.links_within("/") {
            if !parent_dir(&sref.link).is_some_and(|parent| reached.contains(parent)) {
                self.table.remove_symlink(sref.owner, &sref.link);
            }
        }

        let doomed: Vec<(EntryId, String)> = self
            .table
            .entries()
            .filter(|(id, entry)| *id != self.root_id && !reached.contains(entry.path()))
            .map(|(id, entry)| (id, entry.path().to_string()))
            .collect();

        let mut released = Vec::with_capacity(doomed.len());
        for (id, path) in doomed {
            if self.table.remove(id) {
                released.push(path);
            }
        }
        if !released.is_empty() {
            info!(released = released.len(), "unreachable watches released");
        }
        released
    }

    /// Canonical paths of every entry that has at least one link and is an
    /// ancestor or descendant of `path`.
    pub fn referenced_paths(&self, path: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .table
            .entries()
            .filter(|(_, entry)| entry.has_symlinks())
            .filter(|(_, entry)| is_child_of(entry.path(), path) || is_child_of(path, entry.path()))
            .map(|(_, entry)| entry.path().to_string())
            .collect();
        paths.sort();
        paths
    }

    /// Release `owner` and its descendants if they are outside the root and
    /// no longer covered by a referenced directory.
    pub(crate) fn reclaim_owner(&mut self, owner: EntryId) -> Vec<String> {
        let Some(entry) = self.table.get(owner) else {
            return Vec::new();
        };
        if entry.has_symlinks() || self.is_under_root(entry.path()) {
            return Vec::new();
        }
        let owner_path = entry.path().to_string();
        let referenced = self.referenced_paths(&owner_path);

        let doomed: Vec<(EntryId, String)> = self
            .table
            .subtree(&owner_path)
            .into_iter()
            .filter(|(id, entry)| {
                *id != self.root_id
                    && !self.is_under_root(entry.path())
                    && !referenced.iter().any(|r| is_child_of(entry.path(), r))
            })
            .map(|(id, entry)| (id, entry.path().to_string()))
            .collect();

        let mut released = Vec::with_capacity(doomed.len());
        for (id, path) in doomed {
            if self.table.remove(id) {
                released.push(path);
            }
        }
        if !released.is_empty() {
            info!(owner = %owner_path, released = released.len(), "orphaned watches released");
        }
        released
    }
}
