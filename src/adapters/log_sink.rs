//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! structured line through the `log` facade.  A dashboard push or audit
//! trail adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Render one event as its log line.
pub fn render(event: &AppEvent) -> String {
    match event {
        AppEvent::Started(phase) => format!("START | phase={phase}"),
        AppEvent::SampleStored(s) => format!(
            "SAMPLE | T={:.1}\u{00b0}C | H={:.1}% | gas={} | dist={}",
            s.temperature,
            s.humidity,
            s.gas,
            s.distance
                .map_or_else(|| "-".to_owned(), |d| format!("{d:.1}cm")),
        ),
        AppEvent::DirectiveApplied(d) => format!(
            "DECISION | servo={} buzzer={} pump={} fan={} | {}",
            u8::from(d.servo),
            u8::from(d.buzzer),
            u8::from(d.pump),
            u8::from(d.fan),
            d.rationale,
        ),
        AppEvent::AdvisoryDegraded { summary } => format!("ADVISORY | degraded: {summary}"),
        AppEvent::ActuatorOverridden { actuator, active } => format!(
            "OVERRIDE | {actuator} -> {}",
            if *active { "active" } else { "idle" }
        ),
        AppEvent::PhaseChanged { from, to } => format!("PHASE | {from} -> {to}"),
        AppEvent::HistoryReset => "PHASE | history cleared for new cycle".to_owned(),
        AppEvent::ThresholdsUpdated(c) => format!(
            "CONFIG | temp {:.1}-{:.1} | humidity {:.1}-{:.1} | gas_max {}",
            c.temp_min, c.temp_max, c.humidity_min, c.humidity_max, c.gas_max
        ),
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        let line = render(event);
        match event {
            AppEvent::AdvisoryDegraded { .. } => warn!("{line}"),
            _ => info!("{line}"),
        }
    }
}
