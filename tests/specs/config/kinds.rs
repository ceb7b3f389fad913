//! Lock kind configuration specs
//!
//! Verify that kinds loaded from TOML drive lock behavior.

use crate::prelude::*;
use std::io::Write;

const LOCKS_TOML: &str = r#"
[exclusive.report_export]
timeout = 0

[exclusive.billing]
namespace = "billing"
timeout = "infinite"

[read_write.catalog]
read_timeout = 0
write_timeout = "2s"
"#;

#[test]
fn loaded_exclusive_kind_uses_its_timeout() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LOCKS_TOML.as_bytes()).unwrap();
    let config = LocksConfig::load(file.path()).unwrap();

    let kind = config.exclusive("report_export").unwrap();
    let server = Server::new();
    let mut held = server.process().exclusive(kind, vec![]);
    let mut waiting = server.process().exclusive(kind, vec![]);

    held.lock(None).unwrap();
    let err = waiting.lock(None).timed_out_in_write_mode().unwrap_err();
    assert_eq!(err.as_timeout().unwrap().timeout, LockTimeout::NO_WAIT);
}

#[test]
fn namespace_isolates_otherwise_identical_locks() {
    let config = LocksConfig::parse(LOCKS_TOML).unwrap();
    let billing = config.exclusive("billing").unwrap();
    let default_ns = ExclusiveKind::new("billing");

    let server = Server::new();
    let mut a = server.process().exclusive(billing, vec![1.into()]);
    let mut b = server.process().exclusive(&default_ns, vec![1.into()]);

    assert_ne!(a.key(), b.key());
    a.lock(Some(LockTimeout::NO_WAIT)).unwrap();
    b.lock(Some(LockTimeout::NO_WAIT)).unwrap();
}

#[test]
fn loaded_read_write_kind_uses_its_timeouts() {
    let config = LocksConfig::parse(LOCKS_TOML).unwrap();
    let kind = config.read_write("catalog").unwrap();

    let server = Server::new();
    let writer = server.process().read_write(kind, vec![]);
    let reader = server.process().read_write(kind, vec![]);
    writer.lock_write(None).unwrap();

    let err = reader.lock_read(None).timed_out_in_read_mode().unwrap_err();
    assert_eq!(err.as_timeout().unwrap().timeout, LockTimeout::NO_WAIT);
}
