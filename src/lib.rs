// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod kernel;
pub mod logging;
pub mod types;
pub mod watch;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::WatchConfig;
use crate::engine::{EventDispatcher, Runtime};
use crate::fs::{FileSystem, RealFileSystem};
use crate::kernel::{Inotify, WatchService};
use crate::types::event_name;
use crate::watch::Watcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the inotify instance and the initial watch set
/// - the event sink chosen by `--command` / `--format`
/// - the dispatch loop
/// - Ctrl-C handling
pub async fn run(config: WatchConfig, dry_run: bool) -> Result<()> {
    let kernel = Inotify::new()?;
    let watcher = Watcher::initialize(config.options.clone(), kernel, RealFileSystem)?;

    if dry_run {
        print_dry_run(&watcher, &config);
        return Ok(());
    }

    let sink = exec::sink_for(&config.exec, watcher.root());
    let mut runtime = Runtime::new(watcher, EventDispatcher::new(sink));

    tokio::select! {
        res = runtime.run() => res?,
        sig = tokio::signal::ctrl_c() => {
            sig?;
            info!("interrupted; shutting down");
        }
    }
    Ok(())
}

/// Print the initial watch set and the effective settings.
fn print_dry_run<K: WatchService, F: FileSystem>(watcher: &Watcher<K, F>, config: &WatchConfig) {
    println!("treewatch dry-run");
    println!("  root = {}", watcher.root());
    println!("  recursive = {}", watcher.recursive());
    println!("  follow_symlinks = {}", watcher.follow_symlinks());
    println!("  events = {}", describe_mask(watcher.event_mask().bits()));
    if let Some(p) = watcher.filter().exclude_pattern() {
        println!("  exclude = {p}");
    }
    if let Some(p) = watcher.filter().catch_pattern() {
        println!("  catch = {p}");
    }
    println!("  exec = {:?}", config.exec);
    println!();

    println!("watches ({}):", watcher.table().len());
    for path in watcher.table().paths() {
        let Some(id) = watcher.table().lookup_by_path(&path) else {
            continue;
        };
        let Some(entry) = watcher.table().get(id) else {
            continue;
        };
        println!("  [{}] {}", entry.watch_id(), entry.path());
        for link in entry.symlinks() {
            println!("      <- {link}");
        }
    }

    debug!("dry-run complete (no events processed)");
}

fn describe_mask(bits: u32) -> String {
    (0..32)
        .map(|bit| 1u32 << bit)
        .filter(|flag| bits & flag != 0)
        .filter_map(|flag| event_name(types::EventMask::from_bits(flag)))
        .collect::<Vec<_>>()
        .join(",")
}
