//! Event vocabulary for the task engine.
//!
//! Events are the source of truth: immutable once appended, strictly ordered
//! by sequence number, never rewritten or reordered.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::task::{TaskPatch, TaskStatus};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskCompleted,
    TaskReopened,
}

/// Payload of changed fields, tagged by event kind.
///
/// `Created` carries the full field set so that undoing a delete can restore
/// the task exactly as it last stood, status included.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    Created {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        status: TaskStatus,
    },
    Updated {
        patch: TaskPatch,
    },
    Deleted,
    Completed,
    Reopened,
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Created { .. } => EventKind::TaskCreated,
            EventPayload::Updated { .. } => EventKind::TaskUpdated,
            EventPayload::Deleted => EventKind::TaskDeleted,
            EventPayload::Completed => EventKind::TaskCompleted,
            EventPayload::Reopened => EventKind::TaskReopened,
        }
    }

    /// True for payload kinds that target an existing task.
    pub fn requires_existing_task(&self) -> bool {
        !matches!(self, EventPayload::Created { .. })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Event {
    pub seq: u64,
    pub event_id: String,
    pub task_id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(seq: u64, task_id: u64, payload: EventPayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            seq,
            event_id: Ulid::new().to_string(),
            task_id,
            timestamp,
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
