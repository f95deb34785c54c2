//! Sample store.
//!
//! Two views of the ingested time series:
//!
//! - the durable historical log (a [`SampleLog`] port), queried by date
//!   range and cleared when a new composting cycle starts;
//! - a bounded rolling buffer of the last [`RECENT_CAPACITY`] samples for
//!   cheap "recent history" reads.  It is seeded from the log tail at
//!   startup and is **not** cleared by [`SampleStore::reset`].
//!
//! Appends are serialized: the timestamp is taken, the record written and
//! the buffer updated under one lock, so log order equals timestamp order.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use heapless::HistoryBuffer;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Clock, SampleLog};
use crate::error::{Error, StorageError};
use crate::sample::{Sample, SampleInput};

/// Length of the rolling recent-sample buffer.
pub const RECENT_CAPACITY: usize = 100;

/// Inclusive range of UTC calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, sample: &Sample) -> bool {
        let day = sample.timestamp.date_naive();
        self.start <= day && day <= self.end
    }
}

pub struct SampleStore {
    log: Box<dyn SampleLog>,
    clock: Arc<dyn Clock>,
    recent: Mutex<HistoryBuffer<Sample, RECENT_CAPACITY>>,
}

impl SampleStore {
    /// Wrap `log`, seeding the recent buffer from its tail.
    pub fn open(log: Box<dyn SampleLog>, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let mut recent = HistoryBuffer::new();
        let existing = log.load_all()?;
        let tail = existing.len().saturating_sub(RECENT_CAPACITY);
        recent.extend(existing[tail..].iter().copied());
        info!("sample store: {} historical records", existing.len());
        Ok(Self {
            log,
            clock,
            recent: Mutex::new(recent),
        })
    }

    /// Validate `input`, timestamp it and append it to the log and the
    /// recent buffer.  Nothing is stored if validation or the write fails.
    pub fn append(&self, input: &SampleInput) -> Result<Sample, Error> {
        let reading = input.validate()?;

        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        let sample = reading.at(self.clock.now());
        self.log.append(&sample).inspect_err(|e| {
            error!("sample append failed: {e}");
        })?;
        recent.write(sample);
        debug!(
            "sample stored: T={:.1} H={:.1} gas={}",
            sample.temperature, sample.humidity, sample.gas
        );
        Ok(sample)
    }

    /// Most recent sample; `None` means "no data yet".
    pub fn latest(&self) -> Option<Sample> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recent()
            .copied()
    }

    /// Up to [`RECENT_CAPACITY`] samples, oldest first.
    pub fn recent(&self) -> Vec<Sample> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .oldest_ordered()
            .copied()
            .collect()
    }

    /// Every historical sample whose UTC date is inside `range`, ascending.
    pub fn query(&self, range: &DateRange) -> Result<Vec<Sample>, StorageError> {
        let mut samples: Vec<Sample> = self
            .log
            .load_all()?
            .into_iter()
            .filter(|s| range.contains(s))
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }

    /// The full historical log, ascending.
    pub fn all(&self) -> Result<Vec<Sample>, StorageError> {
        let mut samples = self.log.load_all()?;
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }

    /// Drop every historical record.  All-or-nothing.
    pub fn reset(&self) -> Result<(), StorageError> {
        // Hold the append lock so no sample lands between the two states.
        let _recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        self.log.reset().inspect_err(|e| error!("history reset failed: {e}"))?;
        info!("historical samples cleared");
        Ok(())
    }

    /// Number of historical records.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
