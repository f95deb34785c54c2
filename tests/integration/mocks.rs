//! Mock adapters for integration tests.
//!
//! Stub advisory providers with scripted behaviour and an event sink that
//! records everything, so tests can assert on the full event history.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use biobin::adapters::memory::{MemorySampleLog, MemoryStore};
use biobin::adapters::time::FixedClock;
use biobin::advisory::guard::GuardedAdvisor;
use biobin::advisory::{AdvisoryError, Recommendation};
use biobin::app::events::AppEvent;
use biobin::app::ports::{AdvisoryClient, EventSink, StoragePort};
use biobin::app::service::AppService;

// ── Advisory stubs ────────────────────────────────────────────

/// Always answers the same thing.
pub struct FixedAdvisor(pub Result<Recommendation, AdvisoryError>);

impl AdvisoryClient for FixedAdvisor {
    fn analyze(&self, _: f64, _: f64, _: u32) -> Result<Recommendation, AdvisoryError> {
        self.0.clone()
    }
}

pub fn quiet_recommendation() -> Recommendation {
    Recommendation {
        summary: "stable".into(),
        advice: "no action".into(),
        activate_servo: false,
        activate_buzzer: false,
        activate_pump: false,
        activate_fan: false,
    }
}

/// Blocks inside `analyze` until the test releases it.
pub struct GatedAdvisor {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
    answer: Recommendation,
}

pub struct Gate {
    pub entered: Receiver<()>,
    pub release: Sender<()>,
}

impl GatedAdvisor {
    pub fn new(answer: Recommendation) -> (Self, Gate) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Self {
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
                answer,
            },
            Gate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

impl AdvisoryClient for GatedAdvisor {
    fn analyze(&self, _: f64, _: f64, _: u32) -> Result<Recommendation, AdvisoryError> {
        let _ = self.entered.lock().unwrap().send(());
        self.release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| AdvisoryError::Unavailable("gate never released".into()))?;
        Ok(self.answer.clone())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<AppEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Service fixtures ──────────────────────────────────────────

pub struct Fixture {
    pub service: Arc<AppService>,
    pub storage: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
}

pub fn service_with(client: impl AdvisoryClient + 'static, timeout: Duration) -> Fixture {
    let storage = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let service = AppService::open(
        storage.clone() as Arc<dyn StoragePort>,
        Box::new(MemorySampleLog::new()),
        GuardedAdvisor::new(Arc::new(client), timeout),
        sink.clone(),
        Arc::new(FixedClock::epoch()),
    )
    .unwrap();
    Fixture {
        service: Arc::new(service),
        storage,
        sink,
    }
}
