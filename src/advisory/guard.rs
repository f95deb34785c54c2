//! Bounded, rate-limited access to the advisory provider.
//!
//! Every call:
//!
//! 1. **Rate limiting** — token bucket rejects bursts (via `burster`).
//! 2. **Timeout** — the provider runs on a short-lived worker thread; the
//!    caller waits at most `timeout` for the answer.  A worker that misses
//!    the deadline is abandoned and its late answer dropped.
//! 3. **Degradation** — any failure becomes [`Recommendation::safe_default`].
//!
//! [`GuardedAdvisor::consult`] therefore never fails.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use burster::Limiter;
use log::warn;

use super::{AdvisoryError, Recommendation};
use crate::adapters::time::monotonic_now;
use crate::app::ports::AdvisoryClient;
use crate::config::AdvisoryConfig;

type Bucket = burster::TokenBucket<fn() -> Duration>;

/// Result of one guarded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consultation {
    pub recommendation: Recommendation,
    /// Set when `recommendation` is the substituted safe default.
    pub failure: Option<AdvisoryError>,
}

impl Consultation {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    fn degraded(failure: AdvisoryError) -> Self {
        Self {
            recommendation: Recommendation::safe_default(failure.summary()),
            failure: Some(failure),
        }
    }
}

pub struct GuardedAdvisor {
    client: Arc<dyn AdvisoryClient>,
    timeout: Duration,
    limiter: Option<Mutex<Bucket>>,
}

impl GuardedAdvisor {
    /// No rate limit; calls bounded by `timeout`.
    pub fn new(client: Arc<dyn AdvisoryClient>, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            limiter: None,
        }
    }

    /// Build from the `advisory` section of the service configuration.
    pub fn from_config(client: Arc<dyn AdvisoryClient>, config: &AdvisoryConfig) -> Self {
        Self::new(client, Duration::from_millis(config.timeout_ms))
            .with_rate_limit(config.rate_per_sec, config.burst)
    }

    /// Allow `per_sec` calls per second with bursts of `burst`.
    /// `per_sec == 0` disables limiting.
    #[must_use]
    pub fn with_rate_limit(mut self, per_sec: u64, burst: u64) -> Self {
        self.limiter = (per_sec > 0).then(|| {
            Mutex::new(burster::TokenBucket::new_with_time_provider(
                per_sec,
                burst.max(1),
                monotonic_now as fn() -> Duration,
            ))
        });
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the provider about one reading.  Never fails.
    pub fn consult(&self, temperature: f64, humidity: f64, gas: u32) -> Consultation {
        match self.call(temperature, humidity, gas) {
            Ok(recommendation) => Consultation {
                recommendation,
                failure: None,
            },
            Err(e) => {
                warn!("advisory degraded to safe default: {e}");
                Consultation::degraded(e)
            }
        }
    }

    fn call(&self, temperature: f64, humidity: f64, gas: u32) -> Result<Recommendation, AdvisoryError> {
        if let Some(limiter) = &self.limiter {
            let mut bucket = limiter.lock().unwrap_or_else(PoisonError::into_inner);
            if bucket.try_consume(1).is_err() {
                return Err(AdvisoryError::RateLimited);
            }
        }

        let (tx, rx) = mpsc::sync_channel(1);
        let client = Arc::clone(&self.client);
        thread::Builder::new()
            .name("advisory".into())
            .spawn(move || {
                // The receiver is gone if the deadline passed; nothing to do.
                let _ = tx.send(client.analyze(temperature, humidity, gas));
            })
            .map_err(|e| AdvisoryError::Unavailable(format!("worker spawn failed: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(AdvisoryError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AdvisoryError::Unavailable("worker exited without an answer".into()))
            }
        }
    }
}
