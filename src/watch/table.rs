// src/watch/table.rs

//! Registry of installed watches.
//!
//! Entries live in a generational arena and are indexed three ways:
//! by canonical path, by kernel watch id, and by the symbolic links that
//! reference them. Nothing outside this module holds a reference into the
//! arena; callers keep [`EntryId`]s, which simply stop resolving once the
//! entry is gone.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{Result, TreewatchError};
use crate::kernel::{WatchId, WatchService};
use crate::types::EventMask;
use crate::watch::path::is_child_of;

/// Stable handle to a [`WatchEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    watch_id: WatchId,
    path: String,
    symlinks: BTreeSet<String>,
}

impl WatchEntry {
    pub fn watch_id(&self) -> WatchId {
        self.watch_id
    }

    /// Canonical, slash-terminated path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Symbolic links currently resolving to this directory.
    pub fn symlinks(&self) -> &BTreeSet<String> {
        &self.symlinks
    }

    pub fn has_symlinks(&self) -> bool {
        !self.symlinks.is_empty()
    }
}

/// A symbolic link and the entry it keeps alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkRef {
    pub link: String,
    pub owner: EntryId,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<WatchEntry>,
}

#[derive(Debug)]
pub struct WatchTable<K> {
    kernel: K,
    mask: EventMask,
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_path: HashMap<String, EntryId>,
    by_watch_id: HashMap<WatchId, EntryId>,
    link_owners: HashMap<String, EntryId>,
}

impl<K: WatchService> WatchTable<K> {
    pub fn new(kernel: K, mask: EventMask) -> Self {
        Self {
            kernel,
            mask,
            slots: Vec::new(),
            free: Vec::new(),
            by_path: HashMap::new(),
            by_watch_id: HashMap::new(),
            link_owners: HashMap::new(),
        }
    }

    /// Ensure a watch exists for `path`.
    ///
    /// Returns the entry and whether it was created by this call.
    pub fn register(&mut self, path: &str) -> Result<(EntryId, bool)> {
        if let Some(id) = self.by_path.get(path) {
            return Ok((*id, false));
        }

        let watch_id = self
            .kernel
            .add_watch(Path::new(path), self.mask)
            .map_err(|source| classify_add_error(path, source))?;

        if let Some(stale) = self.by_watch_id.get(&watch_id).copied() {
            // The kernel recycled the id, so the old watch is already gone.
            if let Some(old) = self.take(stale) {
                warn!(path = %old.path, wd = %watch_id, "dropping stale watch entry");
            }
        }

        let id = self.alloc(WatchEntry {
            watch_id,
            path: path.to_string(),
            symlinks: BTreeSet::new(),
        });
        self.by_path.insert(path.to_string(), id);
        self.by_watch_id.insert(watch_id, id);

        info!(path, wd = %watch_id, "watch added");
        Ok((id, true))
    }

    /// Release the kernel watch and forget the entry. Returns `false` if the
    /// entry was already gone.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(entry) = self.take(id) else {
            return false;
        };
        if let Err(err) = self.kernel.remove_watch(entry.watch_id) {
            // Expected when the directory itself was deleted: the kernel
            // dropped the watch before we got here.
            debug!(path = %entry.path, wd = %entry.watch_id, error = %err, "inotify_rm_watch refused");
        }
        info!(path = %entry.path, wd = %entry.watch_id, "watch removed");
        true
    }

    pub fn lookup_by_path(&self, path: &str) -> Option<EntryId> {
        self.by_path.get(path).copied()
    }

    pub fn lookup_by_watch_id(&self, watch_id: WatchId) -> Option<EntryId> {
        self.by_watch_id.get(&watch_id).copied()
    }

    pub fn get(&self, id: EntryId) -> Option<&WatchEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Attach `link` to `id`.
    ///
    /// If the link was attached to another entry it moves, and the previous
    /// owner is returned so the caller can check whether it became orphaned.
    pub fn add_symlink(&mut self, id: EntryId, link: &str) -> Option<EntryId> {
        let entry = self.get_mut(id)?;
        if !entry.symlinks.insert(link.to_string()) {
            return None;
        }
        let previous = self.link_owners.insert(link.to_string(), id);
        info!(link, target = %self.path_of(id), "symlink added");

        match previous {
            Some(prev) if prev != id => {
                if let Some(old) = self.get_mut(prev) {
                    old.symlinks.remove(link);
                }
                Some(prev)
            }
            _ => None,
        }
    }

    /// Detach `link` from `id`; returns how many links still reference it.
    pub fn remove_symlink(&mut self, id: EntryId, link: &str) -> usize {
        let Some(entry) = self.get_mut(id) else {
            return 0;
        };
        let removed = entry.symlinks.remove(link);
        let remaining = entry.symlinks.len();
        if self.link_owners.get(link) == Some(&id) {
            self.link_owners.remove(link);
        }
        if removed {
            info!(link, target = %self.path_of(id), remaining, "symlink removed");
        }
        remaining
    }

    pub fn symlink(&self, link: &str) -> Option<SymlinkRef> {
        self.link_owners.get(link).map(|owner| SymlinkRef {
            link: link.to_string(),
            owner: *owner,
        })
    }

    /// Every attached link whose own path lies inside `dir`, sorted.
    pub fn links_within(&self, dir: &str) -> Vec<SymlinkRef> {
        let mut links: Vec<SymlinkRef> = self
            .link_owners
            .iter()
            .filter(|(link, _)| is_child_of(link, dir))
            .map(|(link, owner)| SymlinkRef {
                link: link.clone(),
                owner: *owner,
            })
            .collect();
        links.sort_by(|a, b| a.link.cmp(&b.link));
        links
    }

    /// Entries whose path equals `dir` or lies below it, sorted by path.
    pub fn subtree(&self, dir: &str) -> Vec<(EntryId, &WatchEntry)> {
        let mut found: Vec<_> = self
            .entries()
            .filter(|(_, entry)| is_child_of(&entry.path, dir))
            .collect();
        found.sort_by(|a, b| a.1.path.cmp(&b.1.path));
        found
    }

    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &WatchEntry)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|entry| {
                (
                    EntryId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    entry,
                )
            })
        })
    }

    /// Watched paths in lexical order.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn mask(&self) -> EventMask {
        self.mask
    }

    fn path_of(&self, id: EntryId) -> &str {
        self.get(id).map(|e| e.path.as_str()).unwrap_or("?")
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut WatchEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn alloc(&mut self, entry: WatchEntry) -> EntryId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return EntryId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        EntryId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Unlink the entry from every index without touching the kernel.
    fn take(&mut self, id: EntryId) -> Option<WatchEntry> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        self.by_path.remove(&entry.path);
        if self.by_watch_id.get(&entry.watch_id) == Some(&id) {
            self.by_watch_id.remove(&entry.watch_id);
        }
        for link in &entry.symlinks {
            if self.link_owners.get(link) == Some(&id) {
                self.link_owners.remove(link);
            }
        }
        Some(entry)
    }
}

fn classify_add_error(path: &str, source: io::Error) -> TreewatchError {
    match source.raw_os_error() {
        Some(libc::ENOSPC) | Some(libc::ENOMEM) => TreewatchError::ResourceExhausted {
            path: path.to_string(),
            source,
        },
        _ => TreewatchError::path_unavailable(path, source),
    }
}
