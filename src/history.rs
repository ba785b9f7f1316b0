//! Command history.
//!
//! Every dispatched command leaves one record, successful or not. Records
//! feed the `history` command and the analytics stage; the undo stack keeps
//! its own entries and only references records by id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome summary for one executed command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Outcome {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: "failed".to_string(),
            message: Some(message.into()),
        }
    }
}

/// One entry in command history.
///
/// Volatile fields (record id, timestamp, duration) are kept for audit and
/// analytics but never serialized, so rendered history stays deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRecord {
    #[serde(skip_serializing)]
    pub record_id: Uuid,
    pub input: String,
    pub intent: String,
    pub outcome: Outcome,
    #[serde(skip_serializing)]
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub duration_ms: u64,
}

impl CommandRecord {
    pub fn new(
        input: impl Into<String>,
        intent: impl Into<String>,
        outcome: Outcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            input: input.into(),
            intent: intent.into(),
            outcome,
            timestamp,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    records: Vec<CommandRecord>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CommandRecord) {
        self.records.push(record);
    }

    /// Most recent first.
    pub fn recent(&self, limit: usize) -> Vec<&CommandRecord> {
        self.records.iter().rev().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
