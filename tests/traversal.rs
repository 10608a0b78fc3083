// tests/traversal.rs

use std::error::Error;

use treewatch::errors::TreewatchError;
use treewatch::fs::mock::MockFileSystem;
use treewatch::kernel::fake::FakeKernel;
use treewatch::watch::Watcher;
use treewatch_test_utils::builders::WatchOptionsBuilder;
use treewatch_test_utils::{init_tracing, Harness};

type TestResult = Result<(), Box<dyn Error>>;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn create_link_and_delete_scenario() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;

    h.mkdir("/w/a");
    h.mkdir("/w/a/b");
    assert_eq!(h.paths(), strings(&["/w/", "/w/a/", "/w/a/b/"]));

    // The link resolves to an existing entry: a reference, not a duplicate.
    h.symlink("/w/link", "/w/a");
    assert_eq!(h.paths(), strings(&["/w/", "/w/a/", "/w/a/b/"]));
    assert_eq!(h.links_of("/w/a/"), strings(&["/w/link"]));

    // Both remain: they are inside the root.
    h.unlink("/w/link");
    assert_eq!(h.paths(), strings(&["/w/", "/w/a/", "/w/a/b/"]));
    assert!(h.links_of("/w/a/").is_empty());

    h.rmdir("/w/a");
    assert_eq!(h.paths(), strings(&["/w/"]));
    assert_eq!(h.kernel.watch_count(), 1);
    Ok(())
}

#[test]
fn initial_traversal_is_breadth_first_and_complete() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w/a/b/c");
    fs.add_dir("/w/d");
    fs.add_file("/w/a/file.txt");

    let h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;

    assert_eq!(
        h.paths(),
        strings(&["/w/", "/w/a/", "/w/a/b/", "/w/a/b/c/", "/w/d/"])
    );
    // Level order: the root, then its children, then theirs.
    let order: Vec<String> = h
        .kernel
        .active_watches()
        .into_iter()
        .map(|(_, p)| p.display().to_string())
        .collect();
    assert_eq!(order, strings(&["/w", "/w/a", "/w/d", "/w/a/b", "/w/a/b/c"]));
    Ok(())
}

#[test]
fn excluded_directories_are_never_watched() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w/src");
    fs.add_dir("/w/node_modules/pkg/lib");
    let mut h = Harness::new(
        fs,
        WatchOptionsBuilder::new("/w")
            .recursive()
            .exclude("node_modules")
            .build(),
    )?;
    assert_eq!(h.paths(), strings(&["/w/", "/w/src/"]));

    h.mkdir("/w/src/node_modules");
    h.mkdir("/w/src/node_modules/dep");
    assert!(!h.is_watched("/w/src/node_modules/"));
    assert!(!h.is_watched("/w/src/node_modules/dep/"));
    assert!(h.sink.is_empty());
    Ok(())
}

#[test]
fn non_recursive_mode_watches_only_the_root() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w/a");
    fs.add_dir("/x/y");
    fs.add_symlink("/w/l", "/x/y");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").build())?;
    assert_eq!(h.paths(), strings(&["/w/"]));

    // Still reported, just not tracked.
    h.mkdir("/w/new");
    assert!(!h.is_watched("/w/new/"));
    assert_eq!(h.sink.kinds_and_names(), vec![("create".to_string(), "new".to_string())]);
    Ok(())
}

#[test]
fn no_symlink_mode_ignores_links() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    fs.add_dir("/x/y");
    fs.add_symlink("/w/l", "/x/y");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().no_symlinks().build())?;
    assert_eq!(h.paths(), strings(&["/w/"]));

    h.symlink("/w/m", "/x");
    assert_eq!(h.paths(), strings(&["/w/"]));
    Ok(())
}

#[test]
fn links_out_of_the_root_extend_the_watch_set() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    fs.add_dir("/x/d/e");
    fs.add_symlink("/w/l", "/x/d");
    // Relative link, resolved against the link's directory.
    fs.add_dir("/w/sub");
    fs.add_symlink("/w/sub/rel", "../../x/d/e");

    let h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;

    assert_eq!(
        h.paths(),
        strings(&["/w/", "/w/sub/", "/x/d/", "/x/d/e/"])
    );
    assert_eq!(h.links_of("/x/d/"), strings(&["/w/l"]));
    assert_eq!(h.links_of("/x/d/e/"), strings(&["/w/sub/rel"]));
    Ok(())
}

#[test]
fn links_to_files_and_dangling_links_are_skipped() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    fs.add_file("/x/file");
    fs.add_symlink("/w/to-file", "/x/file");
    fs.add_symlink("/w/dangling", "/nowhere");

    let h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;
    assert_eq!(h.paths(), strings(&["/w/"]));
    assert!(h.watcher.table().symlink("/w/to-file").is_none());
    Ok(())
}

#[test]
fn cyclic_links_terminate() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/w/a/b");
    fs.add_symlink("/w/a/b/up", "/w");
    fs.add_symlink("/w/a/again", "/w/a");
    fs.add_symlink("/w/self", "/w/self");
    fs.add_dir("/x");
    fs.add_symlink("/x/back", "/w");
    fs.add_symlink("/w/out", "/x");

    let h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;

    assert_eq!(h.paths(), strings(&["/w/", "/w/a/", "/w/a/b/", "/x/"]));
    assert_eq!(h.links_of("/w/"), strings(&["/w/a/b/up", "/x/back"]));
    assert_eq!(h.links_of("/w/a/"), strings(&["/w/a/again"]));
    assert!(h.watcher.table().symlink("/w/self").is_none());
    Ok(())
}

#[test]
fn watch_limit_skips_subtrees_but_keeps_going() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/w/a");
    fs.add_dir("/w/b");
    fs.add_dir("/w/c");
    let kernel = FakeKernel::new().with_watch_limit(2);

    let h = Harness::with_kernel(fs, kernel, WatchOptionsBuilder::new("/w").recursive().build())?;

    assert_eq!(h.paths(), strings(&["/w/", "/w/a/"]));
    assert_eq!(h.kernel.watch_count(), 2);
    Ok(())
}

#[test]
fn unreadable_directory_aborts_initialization() {
    let fs = MockFileSystem::new();
    fs.add_dir("/w/a/b");
    fs.deny("/w/a");

    let err = Watcher::initialize(
        WatchOptionsBuilder::new("/w").recursive().build(),
        FakeKernel::new(),
        fs,
    )
    .unwrap_err();

    assert!(matches!(err, TreewatchError::TraversalAborted { ref path, .. } if path == "/w/a/"));
}

#[test]
fn unreadable_directory_in_a_create_event_is_not_fatal() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;

    h.fs.add_dir("/w/n/m");
    h.fs.deny("/w/n");
    let out = h.emit("/w/n", treewatch::types::EventMask::CREATE, true);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].triggered().map(|e| e.name.as_str()), Some("n"));
    // What was registered before the failure stays.
    assert!(h.is_watched("/w/n/"));
    assert!(!h.is_watched("/w/n/m/"));
    assert_eq!(h.sink.len(), 1);

    // The loop carries on with later events.
    h.mkdir("/w/ok");
    assert!(h.is_watched("/w/ok/"));
    Ok(())
}

#[test]
fn root_must_exist_and_be_a_directory() {
    let fs = MockFileSystem::new();
    fs.add_file("/w/file");

    let missing = Watcher::initialize(
        WatchOptionsBuilder::new("/nope").build(),
        FakeKernel::new(),
        fs.clone(),
    );
    assert!(matches!(missing, Err(TreewatchError::PathUnavailable { .. })));

    let file = Watcher::initialize(
        WatchOptionsBuilder::new("/w/file").build(),
        FakeKernel::new(),
        fs,
    );
    assert!(matches!(file, Err(TreewatchError::PathUnavailable { .. })));
}

#[test]
fn root_given_through_a_link_is_canonicalized() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/real/root");
    fs.add_symlink("/alias", "/real/root");

    let h = Harness::new(fs, WatchOptionsBuilder::new("/alias").build())?;
    assert_eq!(h.watcher.root(), "/real/root/");
    assert_eq!(h.paths(), strings(&["/real/root/"]));
    Ok(())
}

#[test]
fn watch_then_unwatch_round_trips() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    fs.add_dir("/x/y");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;
    let before_paths = h.paths();
    let before_watches = h.kernel.active_watches();

    h.fs.add_dir("/w/p/q");
    h.fs.add_symlink("/w/p/l", "/x");
    h.watcher.watch("/w/p/", None)?;
    assert_eq!(
        h.paths(),
        strings(&["/w/", "/w/p/", "/w/p/q/", "/x/", "/x/y/"])
    );

    let released = h.watcher.unwatch("/w/p/", false);
    assert_eq!(released.len(), 4);
    assert_eq!(h.paths(), before_paths);
    assert_eq!(h.kernel.active_watches(), before_watches);
    assert!(h.watcher.table().symlink("/w/p/l").is_none());
    Ok(())
}
