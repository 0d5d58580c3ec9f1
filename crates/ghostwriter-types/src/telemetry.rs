//! Terminal telemetry records for AI invocations.
//!
//! One record per tab-completion or continuation lifecycle, emitted exactly
//! once whether the invocation succeeded, failed, or was cancelled. The
//! sink is fire-and-forget; recording failures never mask the primary
//! outcome.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// How an AI invocation ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvocationOutcome {
    /// Completed normally (including an empty result).
    Success,
    /// Transport, model, or timeout failure.
    Error,
    /// Cancelled by the user or superseded, or aborted on a precondition.
    Aborted,
}

/// Terminal record for one AI invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Which flow this was ("tab-completion", "continuation").
    pub surface: String,
    /// Unix millis at request start.
    pub started_at_ms: u64,
    /// Unix millis at the terminal outcome.
    pub ended_at_ms: u64,
    /// How it ended.
    pub outcome: InvocationOutcome,
    /// Error detail when `outcome` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Current wall-clock time in Unix millis.
pub fn unix_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = InvocationRecord {
            surface: "continuation".into(),
            started_at_ms: 1000,
            ended_at_ms: 2500,
            outcome: InvocationOutcome::Aborted,
            error_message: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"outcome\":\"aborted\""));
        assert!(!json.contains("error_message"));

        let back: InvocationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_unix_millis_monotonic_enough() {
        let a = unix_millis_now();
        let b = unix_millis_now();
        assert!(b >= a);
    }
}
