//! BioBin composting-bin controller library.
//!
//! Sensor ingestion, safety-gated actuation, manual override, process
//! lifecycle and history for an automated composting bin.  Everything the
//! `biobin` binary does goes through [`app::service::AppService`]; the
//! modules are public for integration testing and embedding.

#![deny(unused_must_use)]

pub mod actuators;
pub mod adapters;
pub mod advisory;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod history;
pub mod persist;
pub mod safety;
pub mod sample;
pub mod store;

pub use error::{Error, Result};
