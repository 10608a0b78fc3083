// src/kernel/decode.rs

//! Framing of the inotify byte stream.
//!
//! Each record is a fixed 16-byte header followed by `len` bytes of name:
//!
//! ```text
//! i32 wd | u32 mask | u32 cookie | u32 len | name[len] (NUL padded)
//! ```
//!
//! All integers are in native byte order. A record that does not fit in the
//! remaining bytes means the stream is corrupt and cannot be resynchronized.
//! A record whose name is not valid UTF-8 is skipped.

use tracing::warn;

use crate::errors::{Result, TreewatchError};
use crate::kernel::WatchId;
use crate::types::EventMask;

/// Size of `struct inotify_event` without the name.
pub const HEADER_LEN: usize = 16;

/// One decoded notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    pub watch_id: WatchId,
    pub mask: EventMask,
    pub cookie: u32,
    /// Name relative to the watched directory; empty for events on the
    /// directory itself.
    pub name: String,
}

impl RawNotification {
    pub fn is_dir(&self) -> bool {
        self.mask.contains(EventMask::ISDIR)
    }

    /// Encode this record the way the kernel would, padding the name with
    /// NULs to a multiple of four bytes.
    pub fn encode(&self) -> Vec<u8> {
        let name_len = if self.name.is_empty() {
            0
        } else {
            (self.name.len() + 1).next_multiple_of(4)
        };

        let mut out = Vec::with_capacity(HEADER_LEN + name_len);
        out.extend_from_slice(&self.watch_id.0.to_ne_bytes());
        out.extend_from_slice(&self.mask.bits().to_ne_bytes());
        out.extend_from_slice(&self.cookie.to_ne_bytes());
        out.extend_from_slice(&(name_len as u32).to_ne_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.resize(HEADER_LEN + name_len, 0);
        out
    }
}

/// Iterator over the records of one read from the notification channel.
#[derive(Debug)]
pub struct NotificationDecoder<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> NotificationDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Decode the record at the current offset. `Ok(None)` means it was
    /// skipped.
    fn decode_next(&mut self) -> Result<Option<RawNotification>> {
        let rest = &self.buf[self.offset..];
        if rest.len() < HEADER_LEN {
            return Err(TreewatchError::MalformedNotificationStream(format!(
                "truncated header at offset {}: {} bytes left, {} needed",
                self.offset,
                rest.len(),
                HEADER_LEN
            )));
        }

        let wd = i32::from_ne_bytes(word(rest, 0));
        let mask = u32::from_ne_bytes(word(rest, 4));
        let cookie = u32::from_ne_bytes(word(rest, 8));
        let len = u32::from_ne_bytes(word(rest, 12)) as usize;

        let Some(raw_name) = rest.get(HEADER_LEN..HEADER_LEN + len) else {
            return Err(TreewatchError::MalformedNotificationStream(format!(
                "record at offset {} announces a {len}-byte name but only {} bytes follow",
                self.offset,
                rest.len() - HEADER_LEN
            )));
        };

        let name_end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
        let name = std::str::from_utf8(&raw_name[..name_end]).map(str::to_string);
        let at = self.offset;
        self.offset += HEADER_LEN + len;

        let Ok(name) = name else {
            warn!(wd, offset = at, "skipping event with a non-UTF-8 name");
            return Ok(None);
        };
        Ok(Some(RawNotification {
            watch_id: WatchId(wd),
            mask: EventMask::from_bits(mask),
            cookie,
            name,
        }))
    }
}

impl Iterator for NotificationDecoder<'_> {
    type Item = Result<RawNotification>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed && self.offset < self.buf.len() {
            match self.decode_next() {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

fn word(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}
