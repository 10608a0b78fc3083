// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag can also be given in the `--config` TOML file; flags win.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `treewatch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "treewatch",
    version,
    about = "Run a command or print a line whenever something changes in a directory tree.",
    long_about = None,
    after_help = "Template placeholders for --command and --format:\n  \
        %r  root path being watched\n  \
        %p  directory containing the changed entry\n  \
        %f  name of the changed file or directory\n  \
        %e  event name\n  \
        %x  first capture group of --regex-catch\n  \
        %n  number of events triggered so far\n\n\
        Events: access, modify, attrib, close_write, close_nowrite, close, open,\n  \
        moved_from, moved_to, move, create, delete, delete_self, unmount,\n  \
        q_overflow, ignored, isdir, oneshot, all_events, default"
)]
pub struct CliArgs {
    /// Command to execute for every event (run through `sh -c`).
    #[arg(short = 'c', long, value_name = "COMMAND", conflicts_with = "format")]
    pub command: Option<String>,

    /// Print this line to stdout for every event instead of running a command.
    #[arg(short = 'F', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Directory to watch.
    #[arg(short = 'd', long, value_name = "DIRECTORY")]
    pub directory: Option<String>,

    /// Comma-separated list of events to react to.
    ///
    /// Default: modify,create,delete,move.
    #[arg(short = 'e', long, value_name = "EVENTS")]
    pub events: Option<String>,

    /// Do not traverse or report entries whose name matches this regex.
    #[arg(short = 'x', long, value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Only report entries whose name matches this regex; its first capture
    /// group is available as `%x`.
    #[arg(short = 'X', long, value_name = "REGEX")]
    pub regex_catch: Option<String>,

    /// Do not follow symbolic links to directories.
    #[arg(short = 'n', long)]
    pub no_symlink: bool,

    /// Watch subdirectories too, including ones created later.
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Log every watch change and triggered event.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Also send log messages to syslog.
    #[arg(short = 's', long)]
    pub syslog: bool,

    /// Path to a TOML config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TREEWATCH_LOG`, then `--verbose`, decide.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Install the initial watch set, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
