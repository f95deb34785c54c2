//! Advisory recommendations.
//!
//! The external analysis provider answers with a JSON object, sometimes
//! wrapped in a Markdown code fence:
//!
//! ```text
//! {
//!   "summary": "short description of the current condition",
//!   "advice": "suggested next step",
//!   "activate_servo": true/false,
//!   "activate_buzzer": true/false,
//!   "activate_pump": true/false,
//!   "activate_fan": true/false
//! }
//! ```
//!
//! Missing fields take defaults.  Anything that does not parse into this
//! shape is an [`AdvisoryError::Malformed`], which the [`guard`] turns into
//! [`Recommendation::safe_default`].

pub mod guard;

use core::fmt;

use serde::{Deserialize, Serialize};

/// Advice text used whenever the provider's answer could not be used.
pub const PARSE_FAILED_ADVICE: &str = "Automatic parsing failed. Check the analysis.";

fn no_summary() -> String {
    "No analysis.".to_owned()
}

fn no_advice() -> String {
    "No recommendation.".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default = "no_summary")]
    pub summary: String,
    #[serde(default = "no_advice")]
    pub advice: String,
    #[serde(default)]
    pub activate_servo: bool,
    #[serde(default)]
    pub activate_buzzer: bool,
    #[serde(default)]
    pub activate_pump: bool,
    #[serde(default)]
    pub activate_fan: bool,
}

impl Recommendation {
    /// Parse a provider answer, tolerating a ```` ```json ```` fence.
    pub fn parse(text: &str) -> Result<Self, AdvisoryError> {
        let body = strip_code_fence(text);
        serde_json::from_str(body).map_err(|_| AdvisoryError::Malformed {
            raw: text.trim().to_owned(),
        })
    }

    /// Recommendation substituted on any provider failure: nothing is
    /// activated, `summary` carries the raw answer or the failure text.
    pub fn safe_default(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            advice: PARSE_FAILED_ADVICE.to_owned(),
            activate_servo: false,
            activate_buzzer: false,
            activate_pump: false,
            activate_fan: false,
        }
    }

    pub fn activates_any(&self) -> bool {
        self.activate_servo || self.activate_buzzer || self.activate_pump || self.activate_fan
    }
}

fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a provider call produced no usable recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    /// The call did not finish within the configured bound.
    Timeout,
    /// The provider could not be reached or answered with an error.
    Unavailable(String),
    /// The answer did not match the expected shape.
    Malformed { raw: String },
    /// The local token bucket refused the call.
    RateLimited,
}

impl AdvisoryError {
    /// Summary text for the substituted safe default.
    pub fn summary(&self) -> String {
        match self {
            Self::Malformed { raw } => raw.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "advisory provider timed out"),
            Self::Unavailable(msg) => write!(f, "advisory provider unavailable: {msg}"),
            Self::Malformed { .. } => write!(f, "advisory answer malformed"),
            Self::RateLimited => write!(f, "advisory provider rate limited"),
        }
    }
}

impl std::error::Error for AdvisoryError {}
