// tests/dispatcher.rs

use std::error::Error;

use treewatch::engine::{Disposition, EventDispatcher};
use treewatch::errors::TreewatchError;
use treewatch::fs::mock::MockFileSystem;
use treewatch::kernel::{RawNotification, WatchId};
use treewatch::types::EventMask;
use treewatch_test_utils::builders::WatchOptionsBuilder;
use treewatch_test_utils::{init_tracing, FailingSink, Harness};

type TestResult = Result<(), Box<dyn Error>>;

fn root_only() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    fs
}

#[test]
fn unknown_watch_ids_are_dropped_quietly() -> TestResult {
    let mut h = Harness::new(root_only(), WatchOptionsBuilder::new("/w").build())?;

    let out = h.dispatch_record(WatchId(999), "x".into(), EventMask::CREATE, false);

    assert_eq!(out, vec![Disposition::UnknownWatch]);
    assert!(h.sink.is_empty());
    Ok(())
}

#[test]
fn overflow_is_reported_and_skipped() -> TestResult {
    init_tracing();
    let mut h = Harness::new(root_only(), WatchOptionsBuilder::new("/w").build())?;

    let out = h.dispatch_record(WatchId(-1), String::new(), EventMask::Q_OVERFLOW, false);

    assert_eq!(out, vec![Disposition::Overflow]);
    assert!(h.sink.is_empty());
    Ok(())
}

#[test]
fn events_outside_the_configured_mask_are_dropped() -> TestResult {
    let mut h = Harness::new(
        root_only(),
        WatchOptionsBuilder::new("/w").events(EventMask::CREATE).build(),
    )?;

    assert!(matches!(h.touch("/w/a.txt")[..], [Disposition::Triggered(_)]));
    assert_eq!(h.unlink("/w/a.txt"), vec![Disposition::Masked]);
    assert_eq!(h.emit("/w/b.txt", EventMask::MODIFY, false), vec![Disposition::Masked]);
    assert_eq!(h.sink.len(), 1);
    Ok(())
}

#[test]
fn default_mask_ignores_access_and_open() -> TestResult {
    let mut h = Harness::new(root_only(), WatchOptionsBuilder::new("/w").build())?;

    assert_eq!(h.emit("/w/f", EventMask::ACCESS, false), vec![Disposition::Masked]);
    assert_eq!(h.emit("/w/f", EventMask::OPEN, false), vec![Disposition::Masked]);
    assert!(matches!(
        h.emit("/w/f", EventMask::MODIFY, false)[..],
        [Disposition::Triggered(_)]
    ));
    assert_eq!(h.sink.kinds_and_names(), vec![("modify".to_string(), "f".to_string())]);
    Ok(())
}

#[test]
fn exclude_applies_to_names_before_anything_else() -> TestResult {
    let mut h = Harness::new(
        root_only(),
        WatchOptionsBuilder::new("/w").exclude(r"\.swp$").build(),
    )?;

    assert_eq!(h.touch("/w/.notes.swp"), vec![Disposition::Excluded]);
    // Even for a watch id we do not know.
    let out = h.dispatch_record(WatchId(42), "x.swp".into(), EventMask::CREATE, false);
    assert_eq!(out, vec![Disposition::Excluded]);
    assert!(h.sink.is_empty());
    Ok(())
}

#[test]
fn catch_pattern_filters_and_captures() -> TestResult {
    let mut h = Harness::new(
        root_only(),
        WatchOptionsBuilder::new("/w").catch(r"^(.*)\.scss$").build(),
    )?;

    assert_eq!(h.touch("/w/readme.md"), vec![Disposition::NotCaught]);
    h.touch("/w/style.scss");

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "style.scss");
    assert_eq!(events[0].capture.as_deref(), Some("style"));
    Ok(())
}

#[test]
fn catch_without_a_group_captures_nothing() -> TestResult {
    let mut h = Harness::new(
        root_only(),
        WatchOptionsBuilder::new("/w").catch(r"\.rs$").build(),
    )?;

    h.touch("/w/main.rs");

    assert_eq!(h.sink.events()[0].capture, None);
    Ok(())
}

#[test]
fn directory_events_carry_the_directory_flag() -> TestResult {
    let mut h = Harness::new(root_only(), WatchOptionsBuilder::new("/w").recursive().build())?;

    h.mkdir("/w/a");
    h.touch("/w/a/f");

    let events = h.sink.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].is_dir);
    assert_eq!(events[0].dir, "/w/");
    assert!(!events[1].is_dir);
    assert_eq!(events[1].dir, "/w/a/");
    Ok(())
}

#[test]
fn moved_to_inside_the_root_is_watched() -> TestResult {
    let fs = root_only();
    fs.add_dir("/tmp/incoming/sub");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;

    let out = h.rename("/tmp/incoming", "/w/incoming", true);

    assert_eq!(out.len(), 1);
    assert!(h.is_watched("/w/incoming/"));
    assert!(h.is_watched("/w/incoming/sub/"));
    assert_eq!(h.sink.kinds_and_names(), vec![("moved_to".to_string(), "incoming".to_string())]);
    Ok(())
}

#[test]
fn moved_to_outside_the_root_is_reported_but_not_watched() -> TestResult {
    let fs = root_only();
    fs.add_dir("/x");
    fs.add_symlink("/w/ext", "/x");
    fs.add_dir("/y/d");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;
    assert!(h.is_watched("/x/"));

    h.rename("/y/d", "/x/d", true);

    assert!(!h.is_watched("/x/d/"));
    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "moved_to");
    assert_eq!(events[0].dir, "/x/");
    Ok(())
}

#[test]
fn moved_from_unwatches_the_directory() -> TestResult {
    let fs = root_only();
    fs.add_dir("/w/a/b");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").recursive().build())?;

    h.rename("/w/a", "/tmp/a", true);

    assert_eq!(h.paths(), vec!["/w/".to_string()]);
    assert_eq!(h.sink.kinds_and_names(), vec![("moved_from".to_string(), "a".to_string())]);
    Ok(())
}

#[test]
fn failed_handler_still_runs_the_command() -> TestResult {
    init_tracing();
    let mut h = Harness::new(root_only(), WatchOptionsBuilder::new("/w").recursive().build())?;
    h.kernel.mark_unavailable("/w/gone");

    let out = h.mkdir("/w/gone");

    assert!(matches!(out[..], [Disposition::Triggered(ref e)] if e.name == "gone" && e.is_dir));
    assert!(!h.is_watched("/w/gone/"));
    assert_eq!(h.sink.kinds_and_names(), vec![("create".to_string(), "gone".to_string())]);
    Ok(())
}

#[test]
fn sink_failures_are_logged_unless_fatal() -> TestResult {
    init_tracing();
    let mut h = Harness::new(root_only(), WatchOptionsBuilder::new("/w").build())?;
    let wd = h.watch_id_of("/w/").ok_or("root not watched")?;
    let record = RawNotification {
        watch_id: wd,
        mask: EventMask::CREATE,
        cookie: 0,
        name: "f".to_string(),
    };

    let mut soft = EventDispatcher::new(FailingSink { fatal: false });
    let out = soft.dispatch(&mut h.watcher, &record.encode())?;
    assert!(matches!(out[..], [Disposition::SinkFailed(_)]));

    let mut hard = EventDispatcher::new(FailingSink { fatal: true });
    let err = hard.dispatch(&mut h.watcher, &record.encode()).unwrap_err();
    assert!(matches!(err, TreewatchError::ExecResourceExhausted(_)));
    Ok(())
}
