// src/engine/dispatcher.rs

//! Turning raw notification records into watch-set updates and triggered
//! events.
//!
//! Each record is classified on its own; nothing is remembered between
//! records. The order of the checks matters:
//!
//! 1. queue overflow is logged and skipped;
//! 2. names matching the exclude pattern are dropped;
//! 3. records for watch ids we no longer know are dropped;
//! 4. the event kind is masked with the configured events;
//! 5. names not matching the catch pattern are dropped;
//! 6. the kind's handler updates the watch set; a recoverable failure there
//!    is logged and the event still goes on to the sink;
//! 7. the event is handed to the sink.

use std::path::Path;

use tracing::{debug, trace, warn};

use crate::errors::{Result, TreewatchError};
use crate::exec::{EventSink, TriggeredEvent};
use crate::fs::FileSystem;
use crate::kernel::{NotificationDecoder, RawNotification, WatchService};
use crate::types::{event_name, EventMask};
use crate::watch::path;
use crate::watch::{CatchOutcome, Watcher};

/// What became of one notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Triggered(TriggeredEvent),
    /// Accepted, but the sink reported a non-fatal failure.
    SinkFailed(TriggeredEvent),
    Overflow,
    Excluded,
    UnknownWatch,
    Masked,
    NotCaught,
}

impl Disposition {
    pub fn triggered(&self) -> Option<&TriggeredEvent> {
        match self {
            Disposition::Triggered(event) | Disposition::SinkFailed(event) => Some(event),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct EventDispatcher<S> {
    sink: S,
}

impl<S: EventSink> EventDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Decode every record in `buf` and handle them in order.
    ///
    /// A truncated record is fatal: the stream cannot be resynchronized.
    pub fn dispatch<K, F>(
        &mut self,
        watcher: &mut Watcher<K, F>,
        buf: &[u8],
    ) -> Result<Vec<Disposition>>
    where
        K: WatchService,
        F: FileSystem,
    {
        let mut out = Vec::new();
        for record in NotificationDecoder::new(buf) {
            let record = record?;
            out.push(self.handle(watcher, &record)?);
        }
        Ok(out)
    }

    /// Classify and handle a single record.
    pub fn handle<K, F>(
        &mut self,
        watcher: &mut Watcher<K, F>,
        record: &RawNotification,
    ) -> Result<Disposition>
    where
        K: WatchService,
        F: FileSystem,
    {
        if record.mask.contains(EventMask::Q_OVERFLOW) {
            warn!("kernel event queue overflowed; some changes were not observed");
            return Ok(Disposition::Overflow);
        }

        if watcher.filter().is_excluded(&record.name) {
            trace!(name = %record.name, "excluded");
            return Ok(Disposition::Excluded);
        }

        let Some(entry_id) = watcher.table().lookup_by_watch_id(record.watch_id) else {
            debug!(wd = %record.watch_id, name = %record.name, "event for unknown watch");
            return Ok(Disposition::UnknownWatch);
        };
        let Some(dir) = watcher.table().get(entry_id).map(|e| e.path().to_string()) else {
            return Ok(Disposition::UnknownWatch);
        };

        let event_path = if record.name.is_empty() {
            dir.clone()
        } else if record.is_dir() {
            path::join_dir(&dir, &record.name)
        } else {
            path::join_entry(&dir, &record.name)
        };

        let effective = record.mask & watcher.event_mask();
        let Some(kind) = event_name(effective) else {
            trace!(path = %event_path, mask = ?record.mask, "not a configured event");
            return Ok(Disposition::Masked);
        };

        let capture = match watcher.filter().catch(&record.name) {
            CatchOutcome::Accepted { capture } => capture,
            CatchOutcome::Rejected => {
                trace!(path = %event_path, "not caught");
                return Ok(Disposition::NotCaught);
            }
        };

        if let Err(err) = apply_handler(watcher, kind, &event_path, record.is_dir()) {
            if !err.is_recoverable() {
                return Err(err);
            }
            warn!(event = kind, path = %event_path, error = %err, "handler failed");
        }

        let event = TriggeredEvent {
            kind,
            name: record.name.clone(),
            dir,
            capture,
            is_dir: record.is_dir(),
        };

        match self.sink.trigger(&event) {
            Ok(()) => Ok(Disposition::Triggered(event)),
            Err(err) if err.is_fatal() => Err(TreewatchError::ExecResourceExhausted(err.into_io())),
            Err(err) => {
                warn!(event = kind, path = %event_path, error = %err, "event sink failed");
                Ok(Disposition::SinkFailed(event))
            }
        }
    }
}

/// Structural side effect of an event on the watch set.
fn apply_handler<K, F>(
    watcher: &mut Watcher<K, F>,
    kind: &str,
    event_path: &str,
    is_dir: bool,
) -> Result<()>
where
    K: WatchService,
    F: FileSystem,
{
    match kind {
        "create" => on_create(watcher, event_path, is_dir),
        // Only moves that land inside the root are tracked.
        "moved_to" if watcher.is_under_root(event_path) => on_create(watcher, event_path, is_dir),
        "delete" | "moved_from" => {
            // A deleted entry can't be told apart as file or symlink any more,
            // so anything that is not a directory is treated as a link.
            watcher.unwatch(event_path, !is_dir);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn on_create<K, F>(watcher: &mut Watcher<K, F>, event_path: &str, is_dir: bool) -> Result<()>
where
    K: WatchService,
    F: FileSystem,
{
    if !watcher.recursive() {
        return Ok(());
    }
    if is_dir {
        watcher.watch(event_path, None)?;
    } else if watcher.follow_symlinks() && watcher.fs().is_dir(Path::new(event_path)) {
        let target = path::canonicalize(watcher.fs(), Path::new(event_path))?;
        watcher.watch(&target, Some(event_path))?;
    }
    Ok(())
}
