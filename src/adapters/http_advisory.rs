//! HTTP advisory adapter (blocking `ureq` client).
//!
//! POSTs `{"temperature":…, "humidity":…, "gas":…}` to the configured
//! endpoint and parses the response body with [`Recommendation::parse`],
//! so a provider that wraps its JSON in a code fence is still understood.
//! The agent timeout also bounds the call when used outside the guard.

use std::time::Duration;

use log::debug;
use serde::Serialize;

use crate::advisory::{AdvisoryError, Recommendation};
use crate::app::ports::AdvisoryClient;

#[derive(Serialize)]
struct AnalyzeRequest {
    temperature: f64,
    humidity: f64,
    gas: u32,
}

pub struct HttpAdvisor {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpAdvisor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AdvisoryError> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(AdvisoryError::Unavailable(
                "endpoint must start with http:// or https://".into(),
            ));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("biobin/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(Self { endpoint, agent })
    }
}

impl AdvisoryClient for HttpAdvisor {
    fn analyze(
        &self,
        temperature: f64,
        humidity: f64,
        gas: u32,
    ) -> Result<Recommendation, AdvisoryError> {
        let body = serde_json::to_string(&AnalyzeRequest {
            temperature,
            humidity,
            gas,
        })
        .map_err(|e| AdvisoryError::Unavailable(format!("request encode failed: {e}")))?;

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    AdvisoryError::Unavailable(format!("provider returned HTTP {code}"))
                }
                ureq::Error::Transport(t) => AdvisoryError::Unavailable(t.to_string()),
            })?;

        let text = response
            .into_string()
            .map_err(|e| AdvisoryError::Unavailable(format!("response read failed: {e}")))?;
        debug!("advisory response: {} bytes", text.len());
        Recommendation::parse(&text)
    }
}
