//! Shared helpers for lock specs

pub use dblock_core::{
    ExclusiveKind, ExclusiveLock, FakeConnection, FakeDatabase, LockError, LockTimeout,
    LocksConfig, ReadWriteKind, ReadWriteLock, ScalarParam,
};
pub use std::thread;
pub use std::time::{Duration, Instant};

/// One simulated database server with helpers to open "processes" on it
#[derive(Default)]
pub struct Server {
    pub db: FakeDatabase,
}

impl Server {
    pub fn new() -> Self {
        Self {
            db: FakeDatabase::new(),
        }
    }

    /// A new process with its own connection
    pub fn process(&self) -> Process {
        Process {
            conn: self.db.connect(),
        }
    }
}

pub struct Process {
    pub conn: FakeConnection,
}

impl Process {
    pub fn exclusive(&self, kind: &ExclusiveKind, params: Vec<ScalarParam>) -> ExclusiveLock {
        ExclusiveLock::new(kind.clone(), params, self.conn.provider())
    }

    pub fn read_write(&self, kind: &ReadWriteKind, params: Vec<ScalarParam>) -> ReadWriteLock {
        ReadWriteLock::new(kind.clone(), params, self.conn.provider())
    }
}

/// Assertions on lock outcomes
pub trait LockOutcome {
    fn timed_out_in_write_mode(self) -> Self;
    fn timed_out_in_read_mode(self) -> Self;
}

impl<T: std::fmt::Debug> LockOutcome for Result<T, LockError> {
    #[track_caller]
    fn timed_out_in_write_mode(self) -> Self {
        match &self {
            Err(LockError::Timeout(t)) => assert!(t.write_mode, "expected write mode: {t}"),
            other => panic!("expected write-mode timeout, got {other:?}"),
        }
        self
    }

    #[track_caller]
    fn timed_out_in_read_mode(self) -> Self {
        match &self {
            Err(LockError::Timeout(t)) => assert!(!t.write_mode, "expected read mode: {t}"),
            other => panic!("expected read-mode timeout, got {other:?}"),
        }
        self
    }
}
