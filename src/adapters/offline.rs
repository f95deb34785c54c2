//! Advisory adapter used when no provider is configured.
//!
//! Every call fails as unavailable, so decisions rest on the threshold
//! policy alone.

use crate::advisory::{AdvisoryError, Recommendation};
use crate::app::ports::AdvisoryClient;

#[derive(Debug, Default)]
pub struct OfflineAdvisor;

impl AdvisoryClient for OfflineAdvisor {
    fn analyze(&self, _: f64, _: f64, _: u32) -> Result<Recommendation, AdvisoryError> {
        Err(AdvisoryError::Unavailable("no advisory endpoint configured".into()))
    }
}
