//! Application core: domain orchestration with all I/O behind ports.
//!
//! This module ties the BioBin business rules together: sample ingestion,
//! safety-gated actuation, manual override, process lifecycle and history.
//! All interaction with storage, the advisory provider and the outside world
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable with in-memory adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
