//! Typed records over the [`StoragePort`].
//!
//! Each durable record (thresholds, phase, actuator states) is one postcard
//! blob under the `biobin` namespace.  A missing record loads as the type's
//! default; a record that fails to decode is logged and also replaced by the
//! default, so a corrupted file can never keep the service from starting.

use log::warn;
use serde::{Serialize, de::DeserializeOwned};

use crate::app::ports::StoragePort;
use crate::error::StorageError;

pub const NAMESPACE: &str = "biobin";

pub const KEY_THRESHOLDS: &str = "thresholds";
pub const KEY_PHASE: &str = "phase";
pub const KEY_ACTUATORS: &str = "actuators";

/// Load `key`, falling back to `T::default()` when absent or corrupted.
pub fn load_record<T>(storage: &dyn StoragePort, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match try_load_record(storage, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            warn!("record '{key}' unreadable ({e}), using defaults");
            T::default()
        }
    }
}

/// Load `key`.  `Ok(None)` if the key does not exist.
pub fn try_load_record<T>(storage: &dyn StoragePort, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
{
    let bytes = match storage.read(NAMESPACE, key) {
        Ok(bytes) => bytes,
        Err(StorageError::NotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    postcard::from_bytes(&bytes)
        .map(Some)
        .map_err(|e| StorageError::Corrupted(format!("{key}: {e}")))
}

/// Encode and atomically write `value` under `key`.
pub fn save_record<T>(storage: &dyn StoragePort, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
{
    let bytes =
        postcard::to_allocvec(value).map_err(|e| StorageError::Encode(format!("{key}: {e}")))?;
    storage.write(NAMESPACE, key, &bytes)
}
