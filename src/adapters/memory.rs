//! In-memory storage backends.
//!
//! [`MemoryStore`] implements [`StoragePort`] and [`MemorySampleLog`]
//! implements [`SampleLog`].  Nothing survives the process; used by tests
//! and by the binary when no data directory is wanted.
//!
//! Both can be told to fail writes, so callers can check that a failed
//! write leaves prior state untouched.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::app::ports::{SampleLog, StoragePort};
use crate::error::StorageError;
use crate::sample::Sample;

fn injected_failure() -> StorageError {
    StorageError::Io(io::Error::other("injected write failure"))
}

// ───────────────────────────────────────────────────────────────
// Key-value records
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    store: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }

    /// Make every subsequent `write`/`delete` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

impl StoragePort for MemoryStore {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&Self::composite_key(namespace, key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.check_writable()?;
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&Self::composite_key(namespace, key))
    }
}

// ───────────────────────────────────────────────────────────────
// Sample log
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySampleLog {
    records: RwLock<Vec<Sample>>,
    fail_writes: AtomicBool,
}

impl MemorySampleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log with existing records.
    pub fn with_records(records: Vec<Sample>) -> Self {
        Self {
            records: RwLock::new(records),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `append`/`reset` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SampleLog for MemorySampleLog {
    fn append(&self, sample: &Sample) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*sample);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Sample>, StorageError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn reset(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
