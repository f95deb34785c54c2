//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (state store, sample log, advisory provider, event sinks,
//! clock) implement these traits.  The [`AppService`](super::service::AppService)
//! holds them as trait objects, so the domain core never touches the
//! filesystem or the network directly and tests can swap in stubs.
//!
//! Every port is `Send + Sync`: ingestion, manual control and dashboard
//! reads run concurrently against one service instance.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::advisory::{AdvisoryError, Recommendation};
use crate::error::StorageError;
use crate::sample::Sample;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ durable key-value records)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for thresholds, phase and actuator state.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: a reader sees the old value or the
///   new one, never a torn record, including across a crash mid-write.
pub trait StoragePort: Send + Sync {
    /// Read a value.  [`StorageError::NotFound`] if the key is absent.
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a value atomically.
    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Sample log port (driven adapter: domain ↔ historical time series)
// ───────────────────────────────────────────────────────────────

/// Append-only durable log of stored samples.
///
/// Implementations must make `append` atomic with respect to concurrent
/// readers, and `reset` all-or-nothing: on error the prior records are
/// untouched and the log is still writable.
pub trait SampleLog: Send + Sync {
    fn append(&self, sample: &Sample) -> Result<(), StorageError>;

    /// Every record, in append order.
    fn load_all(&self) -> Result<Vec<Sample>, StorageError>;

    /// Drop every record.
    fn reset(&self) -> Result<(), StorageError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A shared log, so a caller can keep a handle to the adapter it hands over.
impl<L: SampleLog + ?Sized> SampleLog for Arc<L> {
    fn append(&self, sample: &Sample) -> Result<(), StorageError> {
        (**self).append(sample)
    }

    fn load_all(&self) -> Result<Vec<Sample>, StorageError> {
        (**self).load_all()
    }

    fn reset(&self) -> Result<(), StorageError> {
        (**self).reset()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

// ───────────────────────────────────────────────────────────────
// Advisory port (driven adapter: domain → external analysis provider)
// ───────────────────────────────────────────────────────────────

/// External analysis provider.  May be slow, may fail, may return garbage;
/// the [`GuardedAdvisor`](crate::advisory::guard::GuardedAdvisor) bounds and
/// absorbs all of that before the decision engine sees a result.
pub trait AdvisoryClient: Send + Sync {
    fn analyze(
        &self,
        temperature: f64,
        humidity: f64,
        gas: u32,
    ) -> Result<Recommendation, AdvisoryError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for sample timestamps and actuator change times.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
