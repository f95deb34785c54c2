//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the service against
//! in-memory or file-backed adapters and scripted advisory stubs.

mod concurrency_tests;
mod mocks;
mod persistence_tests;
