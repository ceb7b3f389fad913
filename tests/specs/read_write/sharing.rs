//! Read/write lock specs
//!
//! Verify reader sharing and writer exclusion across processes.

use crate::prelude::*;

fn catalog() -> ReadWriteKind {
    ReadWriteKind::new("Catalog")
}

#[test]
fn readers_share_and_writer_waits_for_release() {
    let server = Server::new();
    let reader_a = server.process().read_write(&catalog(), vec!["books".into()]);
    let reader_b = server.process().read_write(&catalog(), vec!["books".into()]);
    let writer = server.process().read_write(&catalog(), vec!["books".into()]);

    reader_a.lock_read(None).unwrap();
    reader_b.lock_read(None).unwrap();

    writer
        .lock_write(Some(LockTimeout::NO_WAIT))
        .timed_out_in_write_mode()
        .unwrap_err();

    reader_a.release().unwrap();
    writer
        .lock_write(Some(LockTimeout::NO_WAIT))
        .timed_out_in_write_mode()
        .unwrap_err();

    reader_b.release().unwrap();
    writer.lock_write(Some(LockTimeout::NO_WAIT)).unwrap();
}

#[test]
fn writer_blocks_new_readers() {
    let server = Server::new();
    let writer = server.process().read_write(&catalog(), vec![]);
    let reader = server.process().read_write(&catalog(), vec![]);

    writer.lock_write(None).unwrap();
    let err = reader
        .lock_read(None)
        .timed_out_in_read_mode()
        .unwrap_err();
    assert_eq!(err.to_string(), "lock Catalog timeout (0s) exceeded in read mode");

    writer.release().unwrap();
    reader.lock_read(None).unwrap();
}

#[test]
fn waiting_writer_acquires_after_reader_releases() {
    let server = Server::new();
    let reader = server.process().read_write(&catalog(), vec![]);
    let writer = server.process().read_write(&catalog(), vec![]);
    reader.lock_read(None).unwrap();

    let handle = thread::spawn(move || writer.lock_write(Some(LockTimeout::Seconds(5))));
    thread::sleep(Duration::from_millis(100));
    reader.release().unwrap();

    handle.join().unwrap().unwrap();
}

#[test]
fn distinct_params_are_independent() {
    let server = Server::new();
    let books = server.process().read_write(&catalog(), vec!["books".into()]);
    let music = server.process().read_write(&catalog(), vec!["music".into()]);

    books.lock_write(None).unwrap();
    music.lock_write(Some(LockTimeout::NO_WAIT)).unwrap();
}
