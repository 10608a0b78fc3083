// src/types.rs

//! Shared value types: the kernel event mask and the execution mode.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// Bit mask of inotify event kinds.
///
/// The constants carry the values from `<sys/inotify.h>`; they are part of the
/// kernel ABI, so the decoder and the fake kernel can use them on any host.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u32);

impl EventMask {
    pub const ACCESS: Self = Self(0x0000_0001);
    pub const MODIFY: Self = Self(0x0000_0002);
    pub const ATTRIB: Self = Self(0x0000_0004);
    pub const CLOSE_WRITE: Self = Self(0x0000_0008);
    pub const CLOSE_NOWRITE: Self = Self(0x0000_0010);
    pub const OPEN: Self = Self(0x0000_0020);
    pub const MOVED_FROM: Self = Self(0x0000_0040);
    pub const MOVED_TO: Self = Self(0x0000_0080);
    pub const CREATE: Self = Self(0x0000_0100);
    pub const DELETE: Self = Self(0x0000_0200);
    pub const DELETE_SELF: Self = Self(0x0000_0400);
    pub const MOVE_SELF: Self = Self(0x0000_0800);
    pub const UNMOUNT: Self = Self(0x0000_2000);
    pub const Q_OVERFLOW: Self = Self(0x0000_4000);
    pub const IGNORED: Self = Self(0x0000_8000);
    pub const ONLYDIR: Self = Self(0x0100_0000);
    pub const DONT_FOLLOW: Self = Self(0x0200_0000);
    pub const EXCL_UNLINK: Self = Self(0x0400_0000);
    pub const MASK_ADD: Self = Self(0x2000_0000);
    pub const ISDIR: Self = Self(0x4000_0000);
    pub const ONESHOT: Self = Self(0x8000_0000);

    pub const CLOSE: Self = Self(Self::CLOSE_WRITE.0 | Self::CLOSE_NOWRITE.0);
    pub const MOVE: Self = Self(Self::MOVED_FROM.0 | Self::MOVED_TO.0);
    pub const ALL_EVENTS: Self = Self(0x0000_0fff);

    /// modify, create, delete and both halves of a move.
    pub const DEFAULT: Self =
        Self(Self::MODIFY.0 | Self::CREATE.0 | Self::DELETE.0 | Self::MOVE.0);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Parse a single event name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        let mask = match name.trim().to_lowercase().as_str() {
            "access" => Self::ACCESS,
            "modify" => Self::MODIFY,
            "attrib" => Self::ATTRIB,
            "close_write" => Self::CLOSE_WRITE,
            "close_nowrite" => Self::CLOSE_NOWRITE,
            "close" => Self::CLOSE,
            "open" => Self::OPEN,
            "moved_from" => Self::MOVED_FROM,
            "moved_to" => Self::MOVED_TO,
            "move" => Self::MOVE,
            "create" => Self::CREATE,
            "delete" => Self::DELETE,
            "delete_self" => Self::DELETE_SELF,
            "move_self" => Self::MOVE_SELF,
            "unmount" => Self::UNMOUNT,
            "q_overflow" => Self::Q_OVERFLOW,
            "ignored" => Self::IGNORED,
            "isdir" => Self::ISDIR,
            "oneshot" => Self::ONESHOT,
            "all_events" => Self::ALL_EVENTS,
            "default" => Self::DEFAULT,
            _ => return None,
        };
        Some(mask)
    }

    /// Parse a list of event names; an empty list means [`EventMask::DEFAULT`].
    pub fn from_names<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = Self::empty();
        for name in names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                continue;
            }
            mask |= Self::from_name(name).ok_or_else(|| {
                format!("unrecognized event \"{}\" in the list of events", name.trim())
            })?;
        }
        if mask.is_empty() {
            mask = Self::DEFAULT;
        }
        Ok(mask)
    }
}

impl FromStr for EventMask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_names(s.split(','))
    }
}

impl BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EventMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventMask({:#010x})", self.0)
    }
}

/// Names indexed by bit position, as printed in `%e` and in the logs.
const BIT_NAMES: [Option<&str>; 32] = [
    Some("access"),
    Some("modify"),
    Some("attrib"),
    Some("close_write"),
    Some("close_nowrite"),
    Some("open"),
    Some("moved_from"),
    Some("moved_to"),
    Some("create"),
    Some("delete"),
    Some("delete_self"),
    Some("move_self"),
    None,
    Some("unmount"),
    Some("q_overflow"),
    Some("ignored"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some("onlydir"),
    Some("dont_follow"),
    Some("excl_unlink"),
    None,
    None,
    Some("mask_add"),
    Some("isdir"),
    Some("oneshot"),
];

/// Name of a triggered event.
///
/// The aggregates `close`, `move` and `all_events` are reported by name when
/// the mask equals them exactly; otherwise the lowest set bit wins.
pub fn event_name(mask: EventMask) -> Option<&'static str> {
    match mask {
        EventMask::CLOSE => Some("close"),
        EventMask::MOVE => Some("move"),
        EventMask::ALL_EVENTS => Some("all_events"),
        m if m.is_empty() => None,
        m => BIT_NAMES[m.bits().trailing_zeros() as usize],
    }
}

/// What to do with an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecMode {
    /// Spawn `sh -c <template>` for every event.
    Command(String),
    /// Print the rendered template to stdout for every event.
    Format(String),
}

impl ExecMode {
    pub fn template(&self) -> &str {
        match self {
            ExecMode::Command(t) | ExecMode::Format(t) => t,
        }
    }
}
