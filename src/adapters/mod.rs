//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements      | Connects to                    |
//! |-----------------|-----------------|--------------------------------|
//! | `memory`        | StoragePort     | in-process map                 |
//! |                 | SampleLog       | in-process vector              |
//! | `file_store`    | StoragePort     | one file per record            |
//! | `sample_file`   | SampleLog       | JSON-lines file                |
//! | `log_sink`      | EventSink       | `log` facade                   |
//! | `time`          | Clock           | system / fixed wall clock      |
//! | `offline`       | AdvisoryClient  | nothing (always unavailable)   |
//! | `http_advisory` | AdvisoryClient  | HTTP provider (`http` feature) |

pub mod file_store;
#[cfg(feature = "http")]
pub mod http_advisory;
pub mod log_sink;
pub mod memory;
pub mod offline;
pub mod sample_file;
pub mod time;
