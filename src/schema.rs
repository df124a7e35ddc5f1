//! access.log_event.v1 schema definition
//!
//! The wire schema for raw access-log entries as delivered by the log
//! acquisition boundary (one JSON object per log row). The core pipeline only
//! requires `timestamp`, `endpoint`, and `user_id`; `cohort_id` and
//! `source_ip` are carried through untouched.

use crate::error::DetectError;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current schema version
pub const SCHEMA_VERSION: &str = "access.log_event.v1";

/// One raw access-log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessEvent {
    /// When the access happened
    pub timestamp: DateTime<Utc>,
    /// Path that was accessed
    pub endpoint: String,
    /// User who made the access
    pub user_id: UserId,
    /// Cohort the user belonged to, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<u32>,
    /// Source address, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
}

impl AccessEvent {
    /// Validate a single event against the schema rules
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.endpoint.trim().is_empty() {
            return Err(DetectError::InvalidEvent(
                "endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of validating one event in a batch
#[derive(Debug)]
pub struct ValidationResult {
    /// Index of the event in the input batch
    pub index: usize,
    /// User the event claimed, for the report
    pub user_id: UserId,
    /// The validation failure
    pub error: DetectError,
}

/// Adapter for parsing and validating access-log event batches
pub struct LogEventAdapter;

impl LogEventAdapter {
    /// Parse a JSON string containing an array of AccessEvents
    pub fn parse_array(json: &str) -> Result<Vec<AccessEvent>, DetectError> {
        let events: Vec<AccessEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (newline-delimited JSON) containing AccessEvents
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<AccessEvent>, DetectError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<AccessEvent>(trimmed) {
                Ok(event) => events.push(event),
                Err(e) => {
                    return Err(DetectError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(events)
    }

    /// Validate a batch of events, returning one entry per failure
    pub fn validate_events(events: &[AccessEvent]) -> Vec<ValidationResult> {
        events
            .iter()
            .enumerate()
            .filter_map(|(idx, event)| {
                event.validate().err().map(|error| ValidationResult {
                    index: idx,
                    user_id: event.user_id,
                    error,
                })
            })
            .collect()
    }

    /// Distinct user ids present in a batch, sorted ascending.
    ///
    /// Callers running the detector over a whole log table iterate this list,
    /// one independent detection per user.
    pub fn user_ids(events: &[AccessEvent]) -> Vec<UserId> {
        let ids: BTreeSet<UserId> = events.iter().map(|e| e.user_id).collect();
        ids.into_iter().collect()
    }
}
