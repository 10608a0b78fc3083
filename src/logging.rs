// src/logging.rs

//! Logging setup for `treewatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (or `[log].level`)
//! 2. `TREEWATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. `info` when `--verbose` is set
//! 4. default to `warn`
//!
//! Logs are sent to STDERR so that `--format` output owns stdout. With
//! `--syslog` every line is additionally sent to the system log.

use std::ffi::{CStr, CString};
use std::io::{self, Write};

use anyhow::Result;
use tracing::{Level, Metadata};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "TREEWATCH_LOG";

const SYSLOG_IDENT: &CStr = c"treewatch";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool, syslog: bool) -> Result<()> {
    let env_level = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_level.as_deref(), verbose);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr);

    let syslog_layer = syslog.then(|| {
        fmt::layer()
            .with_ansi(false)
            .without_time()
            .with_level(false)
            .with_target(false)
            .with_writer(SyslogMakeWriter::open())
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(syslog_layer)
        .with(LevelFilter::from_level(level))
        .try_init()?;

    Ok(())
}

/// Pick the effective level.
pub fn resolve_level(cli_level: Option<LogLevel>, env_level: Option<&str>, verbose: bool) -> Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    if let Some(lvl) = env_level.and_then(parse_level_str) {
        return lvl;
    }
    if verbose { Level::INFO } else { Level::WARN }
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// `MakeWriter` that turns each formatted event into one `syslog(3)` call
/// on the `LOG_LOCAL1` facility.
#[derive(Debug, Clone, Copy)]
pub struct SyslogMakeWriter {
    _private: (),
}

impl SyslogMakeWriter {
    pub fn open() -> Self {
        // SAFETY: the ident is a 'static C string, as openlog requires.
        unsafe { libc::openlog(SYSLOG_IDENT.as_ptr(), libc::LOG_PID, libc::LOG_LOCAL1) };
        Self { _private: () }
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogLine;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogLine::new(libc::LOG_INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogLine::new(syslog_priority(meta.level()))
    }
}

fn syslog_priority(level: &Level) -> libc::c_int {
    match *level {
        Level::ERROR => libc::LOG_ERR,
        Level::WARN => libc::LOG_WARNING,
        Level::INFO => libc::LOG_INFO,
        Level::DEBUG | Level::TRACE => libc::LOG_DEBUG,
    }
}

/// Buffers one formatted event and hands it to syslog when dropped.
#[derive(Debug)]
pub struct SyslogLine {
    priority: libc::c_int,
    buf: Vec<u8>,
}

impl SyslogLine {
    fn new(priority: libc::c_int) -> Self {
        Self {
            priority,
            buf: Vec::with_capacity(256),
        }
    }
}

impl Write for SyslogLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogLine {
    fn drop(&mut self) {
        while self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.is_empty() {
            return;
        }
        self.buf.retain(|&b| b != 0);
        let Ok(message) = CString::new(std::mem::take(&mut self.buf)) else {
            return;
        };
        // SAFETY: both pointers are valid NUL-terminated strings, and the
        // message goes through "%s" so it is never read as a format.
        unsafe { libc::syslog(self.priority, c"%s".as_ptr(), message.as_ptr()) };
    }
}
