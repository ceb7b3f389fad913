//! Connection-scoped ownership specs
//!
//! Verify how the local flag and server ownership diverge.

use crate::prelude::*;

fn kind() -> ExclusiveKind {
    ExclusiveKind::new("Nightly").with_timeout(LockTimeout::NO_WAIT)
}

#[test]
fn lock_objects_on_one_connection_share_ownership() {
    let server = Server::new();
    let process = server.process();
    let mut first = process.exclusive(&kind(), vec!["job".into()]);
    let mut second = process.exclusive(&kind(), vec!["job".into()]);

    first.lock(None).unwrap();

    assert!(matches!(second.lock(None), Err(LockError::AlreadyLocked)));
    second.lock_quietly(None).unwrap();
    assert!(second.is_locked_by_connection().unwrap());
    assert!(!second.is_locked().unwrap());
    assert!(!second.release_if_locked().unwrap());
    assert!(first.is_locked().unwrap());
}

#[test]
fn lost_connection_drops_lock_but_not_flag() {
    let server = Server::new();
    let a = server.process();
    let mut lock = a.exclusive(&kind(), vec![]);
    lock.lock(None).unwrap();

    a.conn.disconnect();

    // Another process can take it immediately
    let mut other = server.process().exclusive(&kind(), vec![]);
    other.lock(None).unwrap();

    // The original object still believes it holds the lock
    assert!(format!("{lock:?}").contains("held: true"), "{lock:?}");
    // ...but can no longer even ask the server
    assert!(matches!(lock.is_locked(), Err(LockError::Query(_))));
    assert!(format!("{lock:?}").contains("held: true"));
}

#[test]
fn lock_taken_over_by_release_on_same_connection() {
    let server = Server::new();
    let process = server.process();
    let mut owner = process.exclusive(&kind(), vec![]);
    let mut cleaner = process.exclusive(&kind(), vec![]);
    owner.lock(None).unwrap();

    assert!(cleaner.force_release().unwrap());

    assert!(!owner.is_locked().unwrap());
    assert!(!owner.release_if_locked().unwrap());
    owner.lock(None).unwrap();
}

#[test]
fn force_release_on_unheld_key_is_false() {
    let server = Server::new();
    let mut lock = server.process().exclusive(&kind(), vec![]);
    assert!(!lock.force_release().unwrap());
    assert!(!lock.is_locked().unwrap());
}

#[test]
fn traced_connection_behaves_like_the_raw_one() {
    use dblock_adapters::TracedExecutor;
    use dblock_core::SharedConnection;
    use std::sync::Arc;

    let server = Server::new();
    let a = server.process();
    let traced = Arc::new(SharedConnection::new(Arc::new(TracedExecutor::new(a.conn.clone()))));
    let mut lock = ExclusiveLock::new(kind(), vec![], traced);
    let mut rival = server.process().exclusive(&kind(), vec![]);

    lock.lock(None).unwrap();
    assert!(lock.is_locked().unwrap());
    assert!(rival.lock(None).is_err());
    assert!(lock.release_if_locked().unwrap());
    rival.lock(None).unwrap();
}
