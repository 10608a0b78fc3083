// src/kernel/mod.rs

//! Kernel change-notification service.
//!
//! The core never talks to inotify directly. It goes through [`WatchService`],
//! which has two implementations:
//! - [`Inotify`], the real Linux backend (non-blocking descriptor driven by
//!   tokio's reactor);
//! - [`fake::FakeKernel`], an in-memory stand-in used by the tests, which
//!   hands out watch ids and replays scripted notification batches.
//!
//! The byte stream produced by both is decoded by [`decode`].

use std::fmt;
use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;

use crate::types::EventMask;

pub mod decode;
pub mod fake;
pub mod inotify;

pub use decode::{NotificationDecoder, RawNotification, HEADER_LEN};
pub use inotify::Inotify;

/// Kernel watch descriptor.
///
/// Only meaningful while the watch is installed; the kernel may hand the same
/// number out again after the watch is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub i32);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Future returned by [`WatchService::read_notifications`].
pub type ReadFuture<'a> = Pin<Box<dyn Future<Output = io::Result<usize>> + Send + 'a>>;

/// Capabilities the watch table needs from the kernel.
pub trait WatchService: Send + Sync {
    /// Install a watch on the directory at `path`.
    fn add_watch(&self, path: &Path, mask: EventMask) -> io::Result<WatchId>;

    /// Remove a previously installed watch.
    fn remove_watch(&self, id: WatchId) -> io::Result<()>;

    /// Wait for the next batch of raw notification records and copy it into
    /// `buf`. `Ok(0)` means the channel is closed.
    fn read_notifications<'a>(&'a self, buf: &'a mut [u8]) -> ReadFuture<'a>;
}
