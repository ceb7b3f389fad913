//! Exclusive lock contention specs
//!
//! Verify that one process at a time holds an exclusive lock.

use crate::prelude::*;

fn report_kind() -> ExclusiveKind {
    ExclusiveKind::new("ReportExport")
}

#[test]
fn second_process_times_out_then_succeeds_after_release() {
    let server = Server::new();
    let a = server.process();
    let b = server.process();
    let mut lock_a = a.exclusive(&report_kind(), vec![7.into()]);
    let mut lock_b = b.exclusive(&report_kind(), vec![7.into()]);

    lock_a.lock(None).unwrap();
    let err = lock_b
        .lock(Some(LockTimeout::NO_WAIT))
        .timed_out_in_write_mode()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "lock ReportExport timeout (0s) exceeded in exclusive (write) mode"
    );

    assert!(lock_a.release_if_locked().unwrap());
    lock_b.lock(Some(LockTimeout::NO_WAIT)).unwrap();
    assert!(lock_b.is_locked().unwrap());
}

#[test]
fn different_params_do_not_contend() {
    let server = Server::new();
    let mut one = server.process().exclusive(&report_kind(), vec![1.into()]);
    let mut two = server.process().exclusive(&report_kind(), vec![2.into()]);

    one.lock(Some(LockTimeout::NO_WAIT)).unwrap();
    two.lock(Some(LockTimeout::NO_WAIT)).unwrap();
}

#[test]
fn different_kinds_do_not_contend() {
    let server = Server::new();
    let mut report = server.process().exclusive(&report_kind(), vec![1.into()]);
    let mut import = server
        .process()
        .exclusive(&ExclusiveKind::new("CatalogImport"), vec![1.into()]);

    report.lock(Some(LockTimeout::NO_WAIT)).unwrap();
    import.lock(Some(LockTimeout::NO_WAIT)).unwrap();
}

#[test]
fn blocked_process_acquires_when_holder_releases() {
    let server = Server::new();
    let holder = server.process();
    let waiter = server.process();
    let mut held = holder.exclusive(&report_kind(), vec![]);
    held.lock(None).unwrap();

    let mut waiting = waiter.exclusive(&report_kind(), vec![]);
    let handle = thread::spawn(move || {
        let start = Instant::now();
        waiting.lock(Some(LockTimeout::Seconds(5))).unwrap();
        (waiting, start.elapsed())
    });

    thread::sleep(Duration::from_millis(100));
    held.force_release().unwrap();

    let (waiting, waited) = handle.join().unwrap();
    assert!(waiting.is_locked().unwrap());
    assert!(waited >= Duration::from_millis(50), "waited {waited:?}");
}

#[test]
fn bounded_wait_expires() {
    let server = Server::new();
    let mut held = server.process().exclusive(&report_kind(), vec![]);
    held.lock(None).unwrap();

    let mut waiting = server.process().exclusive(&report_kind(), vec![]);
    let start = Instant::now();
    waiting
        .lock(Some(LockTimeout::Seconds(1)))
        .timed_out_in_write_mode()
        .unwrap_err();
    assert!(start.elapsed() >= Duration::from_millis(900));
}
