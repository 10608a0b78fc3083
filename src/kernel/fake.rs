// src/kernel/fake.rs

//! In-memory kernel used by the test suite.
//!
//! Watch ids are handed out sequentially starting at 1, like inotify does for
//! a fresh instance. Notification batches are queued by the test and returned
//! one per `read_notifications` call; once the queue is empty the channel
//! reports end-of-stream (`Ok(0)`).

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{RawNotification, ReadFuture, WatchId, WatchService};
use crate::types::EventMask;

#[derive(Debug, Default)]
struct FakeState {
    next_id: i32,
    watches: BTreeMap<WatchId, (PathBuf, EventMask)>,
    limit: Option<usize>,
    unavailable: BTreeSet<PathBuf>,
    pending: VecDeque<Vec<u8>>,
}

/// Scriptable [`WatchService`]. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeKernel {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeKernel {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                next_id: 1,
                ..FakeState::default()
            })),
        }
    }

    /// Refuse new watches with `ENOSPC` once `limit` are installed.
    pub fn with_watch_limit(self, limit: usize) -> Self {
        self.state.lock().unwrap().limit = Some(limit);
        self
    }

    /// Make `add_watch` on `path` fail with `ENOENT`.
    pub fn mark_unavailable(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .unavailable
            .insert(strip_slash(path.as_ref()));
    }

    /// Queue one raw batch, returned verbatim by the next read.
    pub fn push_batch(&self, bytes: Vec<u8>) {
        self.state.lock().unwrap().pending.push_back(bytes);
    }

    /// Queue a batch holding a single encoded record.
    pub fn push_record(&self, record: &RawNotification) {
        self.push_batch(record.encode());
    }

    pub fn pending_batches(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    pub fn watch_count(&self) -> usize {
        self.state.lock().unwrap().watches.len()
    }

    /// Installed watches as `(id, path)`, ordered by id.
    pub fn active_watches(&self) -> Vec<(WatchId, PathBuf)> {
        self.state
            .lock()
            .unwrap()
            .watches
            .iter()
            .map(|(id, (path, _))| (*id, path.clone()))
            .collect()
    }

    pub fn id_for(&self, path: impl AsRef<Path>) -> Option<WatchId> {
        let path = strip_slash(path.as_ref());
        self.state
            .lock()
            .unwrap()
            .watches
            .iter()
            .find(|(_, (p, _))| *p == path)
            .map(|(id, _)| *id)
    }

    pub fn mask_for(&self, id: WatchId) -> Option<EventMask> {
        self.state.lock().unwrap().watches.get(&id).map(|(_, m)| *m)
    }

    /// Drop a watch behind the table's back, the way the kernel does when a
    /// watched directory is deleted.
    pub fn forget(&self, id: WatchId) {
        self.state.lock().unwrap().watches.remove(&id);
    }
}

impl WatchService for FakeKernel {
    fn add_watch(&self, path: &Path, mask: EventMask) -> io::Result<WatchId> {
        let path = strip_slash(path);
        let mut state = self.state.lock().unwrap();

        if state.unavailable.contains(&path) {
            return Err(io::Error::from_raw_os_error(libc::ENOENT));
        }
        if let Some((id, _)) = state.watches.iter().find(|(_, (p, _))| *p == path) {
            return Ok(*id);
        }
        if state.limit.is_some_and(|limit| state.watches.len() >= limit) {
            return Err(io::Error::from_raw_os_error(libc::ENOSPC));
        }

        let id = WatchId(state.next_id);
        state.next_id += 1;
        state.watches.insert(id, (path, mask));
        Ok(id)
    }

    fn remove_watch(&self, id: WatchId) -> io::Result<()> {
        match self.state.lock().unwrap().watches.remove(&id) {
            Some(_) => Ok(()),
            None => Err(io::Error::from_raw_os_error(libc::EINVAL)),
        }
    }

    fn read_notifications<'a>(&'a self, buf: &'a mut [u8]) -> ReadFuture<'a> {
        Box::pin(async move {
            let Some(batch) = self.state.lock().unwrap().pending.pop_front() else {
                return Ok(0);
            };
            if batch.len() > buf.len() {
                return Err(io::Error::from_raw_os_error(libc::EINVAL));
            }
            buf[..batch.len()].copy_from_slice(&batch);
            Ok(batch.len())
        })
    }
}

fn strip_slash(path: &Path) -> PathBuf {
    path.components().collect()
}
