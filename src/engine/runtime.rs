// src/engine/runtime.rs

use std::fmt;

use tracing::{debug, info};

use crate::errors::{Result, TreewatchError};
use crate::exec::EventSink;
use crate::fs::FileSystem;
use crate::kernel::inotify::READ_BUFFER_SIZE;
use crate::kernel::WatchService;
use crate::watch::Watcher;

use super::dispatcher::{Disposition, EventDispatcher};

/// Reads the kernel notification channel and feeds each batch to the
/// dispatcher.
///
/// This is the IO shell around [`EventDispatcher`], which holds all the
/// per-record semantics. The read is the only place the loop suspends.
pub struct Runtime<K, F, S> {
    watcher: Watcher<K, F>,
    dispatcher: EventDispatcher<S>,
    buffer: Vec<u8>,
}

impl<K, F, S> fmt::Debug for Runtime<K, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("buffer_len", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl<K, F, S> Runtime<K, F, S>
where
    K: WatchService,
    F: FileSystem,
    S: EventSink,
{
    pub fn new(watcher: Watcher<K, F>, dispatcher: EventDispatcher<S>) -> Self {
        Self {
            watcher,
            dispatcher,
            buffer: vec![0; READ_BUFFER_SIZE],
        }
    }

    pub fn watcher(&self) -> &Watcher<K, F> {
        &self.watcher
    }

    pub fn dispatcher(&self) -> &EventDispatcher<S> {
        &self.dispatcher
    }

    /// Main loop. Only returns on a fatal error; a closed channel counts as
    /// one.
    pub async fn run(&mut self) -> Result<()> {
        info!(root = %self.watcher.root(), "waiting for events");
        loop {
            let dispositions = self.step().await?;
            debug!(records = dispositions.len(), "batch dispatched");
        }
    }

    /// Read one batch from the kernel and dispatch it.
    pub async fn step(&mut self) -> Result<Vec<Disposition>> {
        let n = self
            .watcher
            .table()
            .kernel()
            .read_notifications(&mut self.buffer)
            .await
            .map_err(TreewatchError::ChannelRead)?;
        if n == 0 {
            return Err(TreewatchError::ChannelClosed);
        }
        self.dispatcher.dispatch(&mut self.watcher, &self.buffer[..n])
    }
}
