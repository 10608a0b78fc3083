// src/watch/traversal.rs

//! Installing and removing watches over whole subtrees.

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{Result, TreewatchError};
use crate::fs::{EntryKind, FileSystem};
use crate::kernel::WatchService;
use crate::watch::path::{self, is_child_of, parent_dir};
use crate::watch::table::EntryId;
use crate::watch::watcher::Watcher;

impl<K: WatchService, F: FileSystem> Watcher<K, F> {
    /// Watch `real_path` and, in recursive mode, everything reachable below it.
    ///
    /// `origin` is the symbolic link through which `real_path` was reached.
    /// Children that cannot be registered are logged and skipped; a
    /// directory that cannot be listed aborts the call with
    /// [`TreewatchError::TraversalAborted`], leaving what was already
    /// registered in place.
    pub fn watch(&mut self, real_path: &str, origin: Option<&str>) -> Result<EntryId> {
        let (id, _) = self.table.register(real_path)?;
        if let Some(link) = origin {
            self.attach_symlink(id, link);
        }

        let mut queue = VecDeque::from([real_path.to_string()]);
        while let Some(dir) = queue.pop_front() {
            let listing = self.fs.read_dir(Path::new(&dir)).map_err(|source| {
                TreewatchError::TraversalAborted {
                    path: dir.clone(),
                    source,
                }
            })?;

            for child in listing {
                if self.filter.is_excluded(&child.name) {
                    debug!(dir = %dir, name = %child.name, "excluded from traversal");
                    continue;
                }
                match child.kind {
                    EntryKind::Directory if self.recursive => {
                        let child_path = path::join_dir(&dir, &child.name);
                        match self.table.register(&child_path) {
                            Ok((_, true)) => queue.push_back(child_path),
                            Ok((_, false)) => {}
                            Err(err) if err.is_recoverable() => {
                                warn!(path = %child_path, error = %err, "skipping subtree");
                            }
                            Err(err) => return Err(err),
                        }
                    }
                    EntryKind::Symlink if self.recursive && self.follow_symlinks => {
                        let link = path::join_entry(&dir, &child.name);
                        if let Some(target) = self.follow_link(&link)? {
                            queue.push_back(target);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(id)
    }

    /// Attach a link met during traversal. Returns the target directory when
    /// it was newly registered and still needs to be traversed.
    fn follow_link(&mut self, link: &str) -> Result<Option<String>> {
        if self.table.symlink(link).is_some() {
            return Ok(None);
        }

        let target = match path::canonicalize(&self.fs, Path::new(link)) {
            Ok(target) => target,
            Err(err) => {
                debug!(link, error = %err, "ignoring unresolvable symlink");
                return Ok(None);
            }
        };
        if !self.fs.is_dir(Path::new(&target)) {
            return Ok(None);
        }

        // Target already watched: only record the reference. This is also
        // what stops links pointing back up the tree from looping.
        if let Some(existing) = self.table.lookup_by_path(&target) {
            self.attach_symlink(existing, link);
            return Ok(None);
        }

        match self.table.register(&target) {
            Ok((id, _)) => {
                self.attach_symlink(id, link);
                Ok(Some(target))
            }
            Err(err) if err.is_recoverable() => {
                warn!(link, target = %target, error = %err, "skipping symlinked subtree");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Record that `link` resolves to `id`. When the link previously pointed
    /// elsewhere, the old target is reclaimed if nothing else reaches it.
    pub(crate) fn attach_symlink(&mut self, id: EntryId, link: &str) {
        if let Some(previous) = self.table.add_symlink(id, link) {
            let released = self.reclaim_owner(previous);
            let orphans = self.orphaned_links(&released);
            self.unwatch_links(orphans.into());
            self.release_unreachable();
        }
    }

    /// Stop watching `path`.
    ///
    /// With `as_symlink` the path is a link that went away and only the
    /// directories it kept alive are released. Otherwise `path` is a
    /// directory that went away: it and every directory below it are
    /// released, except those still reached through a link outside it.
    /// Either way, anything outside the root that is no longer reached
    /// through a chain of links from the root is released as well.
    ///
    /// Returns the canonical paths of every released entry.
    pub fn unwatch(&mut self, path: &str, as_symlink: bool) -> Vec<String> {
        if as_symlink {
            let mut released = self.unwatch_links(VecDeque::from([path.to_string()]));
            released.extend(self.release_unreachable());
            return released;
        }

        if path == self.root {
            warn!(path, "refusing to unwatch the root directory");
            return Vec::new();
        }

        let subtree: Vec<(EntryId, String)> = self
            .table
            .subtree(path)
            .into_iter()
            .map(|(id, entry)| (id, entry.path().to_string()))
            .collect();
        if subtree.is_empty() {
            return Vec::new();
        }

        // Drop references that no longer lead anywhere: links inside the
        // removed subtree, and links that now resolve elsewhere.
        for (id, entry_path) in &subtree {
            let links: Vec<String> = self
                .table
                .get(*id)
                .map(|e| e.symlinks().iter().cloned().collect())
                .unwrap_or_default();
            for link in links {
                if !self.link_is_live(&link, entry_path, path) {
                    self.table.remove_symlink(*id, &link);
                }
            }
        }

        let referenced: Vec<&str> = subtree
            .iter()
            .filter(|(id, entry_path)| {
                entry_path != path && self.table.get(*id).is_some_and(|e| e.has_symlinks())
            })
            .map(|(_, entry_path)| entry_path.as_str())
            .collect();

        let doomed: Vec<(EntryId, String)> = subtree
            .iter()
            .filter(|(id, entry_path)| {
                *id != self.root_id
                    && (entry_path == path
                        || !referenced.iter().any(|r| is_child_of(entry_path, r)))
            })
            .cloned()
            .collect();

        let mut released = Vec::with_capacity(doomed.len());
        for (id, entry_path) in doomed {
            if self.table.remove(id) {
                released.push(entry_path);
            }
        }
        info!(path, released = released.len(), "directory unwatched");

        let orphans = self.orphaned_links(&released);
        released.extend(self.unwatch_links(orphans.into()));
        released.extend(self.release_unreachable());
        released
    }

    /// Breadth-first over the link graph: unwatch each link, then queue the
    /// links that sat inside any directory this released.
    fn unwatch_links(&mut self, mut queue: VecDeque<String>) -> Vec<String> {
        let mut released = Vec::new();
        let mut seen = BTreeSet::new();
        while let Some(link) = queue.pop_front() {
            if !seen.insert(link.clone()) {
                continue;
            }
            let freed = self.detach_link(&link);
            queue.extend(self.orphaned_links(&freed));
            released.extend(freed);
        }
        released
    }

    /// Links located inside one of `dirs` whose containing directory is no
    /// longer watched.
    fn orphaned_links(&self, dirs: &[String]) -> Vec<String> {
        let mut found = BTreeSet::new();
        for dir in dirs {
            for sref in self.table.links_within(dir) {
                let contained = parent_dir(&sref.link)
                    .is_some_and(|parent| self.table.lookup_by_path(parent).is_some());
                if !contained {
                    found.insert(sref.link);
                }
            }
        }
        found.into_iter().collect()
    }

    /// A link keeps `entry_path` alive only if it sits outside the removed
    /// subtree and still resolves to the entry.
    fn link_is_live(&self, link: &str, entry_path: &str, removed: &str) -> bool {
        if is_child_of(link, removed) {
            return false;
        }
        matches!(path::canonicalize(&self.fs, Path::new(link)), Ok(target) if target == entry_path)
    }
}
