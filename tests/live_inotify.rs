// tests/live_inotify.rs
//
// Exercises the real inotify backend against a temporary directory.

use std::error::Error;
use std::fs;
use std::os::unix::fs::symlink;

use tempfile::TempDir;
use treewatch::engine::{EventDispatcher, Runtime};
use treewatch::fs::RealFileSystem;
use treewatch::kernel::Inotify;
use treewatch::watch::path::with_trailing_slash;
use treewatch::watch::Watcher;
use treewatch_test_utils::builders::WatchOptionsBuilder;
use treewatch_test_utils::{init_tracing, with_timeout, RecordingSink};

type TestResult = Result<(), Box<dyn Error>>;

fn canonical(dir: &TempDir) -> Result<String, Box<dyn Error>> {
    let real = fs::canonicalize(dir.path())?;
    Ok(with_trailing_slash(&real.display().to_string()))
}

#[tokio::test]
async fn new_directories_are_picked_up() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let root = canonical(&tmp)?;

    let watcher = Watcher::initialize(
        WatchOptionsBuilder::new(tmp.path()).recursive().build(),
        Inotify::new()?,
        RealFileSystem,
    )?;
    assert_eq!(watcher.root(), root);
    let mut rt = Runtime::new(watcher, EventDispatcher::new(RecordingSink::new()));

    fs::create_dir(tmp.path().join("sub"))?;
    with_timeout(rt.step()).await?;

    let sub = format!("{root}sub/");
    assert!(rt.watcher().table().lookup_by_path(&sub).is_some());
    assert_eq!(
        rt.dispatcher().sink().kinds_and_names(),
        vec![("create".to_string(), "sub".to_string())]
    );

    // The new watch is live: events inside it are reported.
    fs::write(tmp.path().join("sub").join("file.txt"), "hello")?;
    let out = with_timeout(rt.step()).await?;
    let first = out.iter().find_map(|d| d.triggered()).ok_or("nothing triggered")?;
    assert_eq!(first.dir, sub);
    assert_eq!(first.name, "file.txt");
    Ok(())
}

#[tokio::test]
async fn links_leaving_the_root_are_followed() -> TestResult {
    let tmp = TempDir::new()?;
    let outside = TempDir::new()?;
    fs::create_dir(outside.path().join("inner"))?;
    symlink(outside.path(), tmp.path().join("out"))?;

    let watcher = Watcher::initialize(
        WatchOptionsBuilder::new(tmp.path()).recursive().build(),
        Inotify::new()?,
        RealFileSystem,
    )?;

    let target = canonical(&outside)?;
    let table = watcher.table();
    let id = table.lookup_by_path(&target).ok_or("link target not watched")?;
    assert!(table.lookup_by_path(&format!("{target}inner/")).is_some());
    let links: Vec<String> = table
        .get(id)
        .map(|e| e.symlinks().iter().cloned().collect())
        .unwrap_or_default();
    assert_eq!(links, vec![format!("{}out", canonical(&tmp)?)]);
    Ok(())
}
