// tests/decoder.rs

use std::error::Error;

use treewatch::errors::TreewatchError;
use treewatch::fs::mock::MockFileSystem;
use treewatch::kernel::{NotificationDecoder, RawNotification, WatchId, HEADER_LEN};
use treewatch::types::EventMask;
use treewatch_test_utils::builders::WatchOptionsBuilder;
use treewatch_test_utils::Harness;

type TestResult = Result<(), Box<dyn Error>>;

fn record(wd: i32, mask: EventMask, name: &str) -> RawNotification {
    RawNotification {
        watch_id: WatchId(wd),
        mask,
        cookie: 0,
        name: name.to_string(),
    }
}

#[test]
fn names_are_nul_padded_to_four_bytes() {
    assert_eq!(record(1, EventMask::CREATE, "foo").encode().len(), HEADER_LEN + 4);
    assert_eq!(record(1, EventMask::CREATE, "abcd").encode().len(), HEADER_LEN + 8);
    assert_eq!(record(1, EventMask::DELETE_SELF, "").encode().len(), HEADER_LEN);
}

#[test]
fn decoder_advances_exactly_past_each_record() -> TestResult {
    let mut buf = record(1, EventMask::CREATE, "foo").encode();
    buf.extend(record(1, EventMask::DELETE, "bar").encode());

    let mut decoder = NotificationDecoder::new(&buf);

    let first = decoder.next().ok_or("missing first record")??;
    assert_eq!(first.name, "foo");
    assert_eq!(first.mask, EventMask::CREATE);
    assert_eq!(decoder.offset(), HEADER_LEN + 4);

    let second = decoder.next().ok_or("missing second record")??;
    assert_eq!(second.name, "bar");
    assert_eq!(second.mask, EventMask::DELETE);
    assert_eq!(decoder.offset(), buf.len());
    assert_eq!(decoder.remaining(), 0);

    assert!(decoder.next().is_none());
    Ok(())
}

#[test]
fn two_records_are_dispatched_in_order() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").build())?;
    let wd = h.watch_id_of("/w/").ok_or("root not watched")?;

    let mut buf = record(wd.0, EventMask::CREATE, "foo").encode();
    buf.extend(record(wd.0, EventMask::DELETE, "bar").encode());

    let out = h.dispatcher.dispatch(&mut h.watcher, &buf)?;

    assert_eq!(out.len(), 2);
    assert_eq!(
        h.sink.kinds_and_names(),
        vec![
            ("create".to_string(), "foo".to_string()),
            ("delete".to_string(), "bar".to_string()),
        ]
    );
    let events = h.sink.events();
    assert!(events.iter().all(|e| e.dir == "/w/" && !e.is_dir));
    Ok(())
}

#[test]
fn truncated_header_is_fatal() {
    let buf = record(1, EventMask::CREATE, "foo").encode();
    let truncated = &buf[..HEADER_LEN - 6];

    let results: Vec<_> = NotificationDecoder::new(truncated).collect();

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(TreewatchError::MalformedNotificationStream(_))
    ));
}

#[test]
fn name_running_past_the_buffer_is_fatal() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").build())?;

    let mut buf = record(1, EventMask::CREATE, "ok").encode();
    let bad = record(1, EventMask::CREATE, "a-long-name-here").encode();
    buf.extend_from_slice(&bad[..HEADER_LEN + 4]);

    let err = h.dispatcher.dispatch(&mut h.watcher, &buf).unwrap_err();

    assert!(matches!(err, TreewatchError::MalformedNotificationStream(_)));
    assert!(!err.is_recoverable());
    // Nothing after the corrupt point is trusted; the first record was
    // already handled.
    assert_eq!(h.sink.len(), 1);
    Ok(())
}

#[test]
fn decoder_stops_after_the_first_error() {
    let garbage = vec![0u8; 7];
    let mut decoder = NotificationDecoder::new(&garbage);

    assert!(matches!(decoder.next(), Some(Err(_))));
    assert!(decoder.next().is_none());
}

/// A record named "fxo" whose middle byte is replaced by 0xFF.
fn non_utf8_record(wd: i32) -> Vec<u8> {
    let mut bytes = record(wd, EventMask::CREATE, "fxo").encode();
    bytes[HEADER_LEN + 1] = 0xFF;
    bytes
}

#[test]
fn names_that_are_not_utf8_are_skipped() -> TestResult {
    let mut buf = non_utf8_record(1);
    buf.extend(record(1, EventMask::DELETE, "next").encode());

    let mut decoder = NotificationDecoder::new(&buf);

    let only = decoder.next().ok_or("valid record lost")??;
    assert_eq!(only.name, "next");
    assert_eq!(decoder.offset(), buf.len());
    assert!(decoder.next().is_none());
    Ok(())
}

#[test]
fn skipped_names_never_reach_the_sink() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/w");
    let mut h = Harness::new(fs, WatchOptionsBuilder::new("/w").build())?;
    let wd = h.watch_id_of("/w/").ok_or("root not watched")?;

    let mut buf = non_utf8_record(wd.0);
    buf.extend(record(wd.0, EventMask::CREATE, "fine").encode());

    let out = h.dispatcher.dispatch(&mut h.watcher, &buf)?;

    assert_eq!(out.len(), 1);
    assert_eq!(h.sink.kinds_and_names(), vec![("create".to_string(), "fine".to_string())]);
    Ok(())
}
