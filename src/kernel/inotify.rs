// src/kernel/inotify.rs

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tokio::io::unix::AsyncFd;
use tracing::trace;

use super::{ReadFuture, WatchId, WatchService};
use crate::types::EventMask;

/// Suggested size for the read buffer: comfortably more than one
/// `struct inotify_event` with a `NAME_MAX` name.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Non-blocking inotify instance registered with the tokio reactor.
#[derive(Debug)]
pub struct Inotify {
    fd: AsyncFd<OwnedFd>,
}

impl Inotify {
    /// Create the instance. Must be called from within a tokio runtime.
    pub fn new() -> io::Result<Self> {
        // SAFETY: plain syscall, no pointers involved.
        let raw = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `raw` is a freshly created descriptor that nothing else owns.
        let owned = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Self {
            fd: AsyncFd::new(owned)?,
        })
    }
}

impl WatchService for Inotify {
    fn add_watch(&self, path: &Path, mask: EventMask) -> io::Result<WatchId> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: `c_path` is NUL terminated and outlives the call.
        let wd = unsafe {
            libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), mask.bits())
        };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }
        trace!(path = %path.display(), wd, "inotify_add_watch");
        Ok(WatchId(wd))
    }

    fn remove_watch(&self, id: WatchId) -> io::Result<()> {
        // SAFETY: plain syscall on a descriptor we own.
        let rc = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), id.0) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn read_notifications<'a>(&'a self, buf: &'a mut [u8]) -> ReadFuture<'a> {
        Box::pin(async move {
            loop {
                let mut guard = self.fd.readable().await?;
                let result = guard.try_io(|inner| {
                    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
                    let n = unsafe {
                        libc::read(
                            inner.as_raw_fd(),
                            buf.as_mut_ptr().cast::<libc::c_void>(),
                            buf.len(),
                        )
                    };
                    if n < 0 {
                        Err(io::Error::last_os_error())
                    } else {
                        Ok(n as usize)
                    }
                });
                match result {
                    Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Ok(res) => return res,
                    // Spurious wakeup; readiness was cleared, wait again.
                    Err(_would_block) => continue,
                }
            }
        })
    }
}
