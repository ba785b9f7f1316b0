//! Append-only in-memory event store.
//!
//! The store owns the ordered log and the live projection. Appends validate
//! against the projection before mutating either, so a rejected append leaves
//! no trace. Sequence numbers start at 0 and are never reused.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::event::{Event, EventPayload};
use crate::projection::Projection;

#[derive(Debug, Clone, Default)]
pub struct EventStore {
    log: Vec<Event>,
    projection: Projection,
    next_task_id: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            projection: Projection::new(),
            next_task_id: 1,
        }
    }

    /// Next unused task id. The id is consumed only when the create event
    /// is actually appended.
    pub fn peek_next_task_id(&self) -> u64 {
        self.next_task_id.max(1)
    }

    /// Append an event, assign its sequence number, and apply it to the
    /// live projection. Malformed events (unknown task id, duplicate
    /// create) are rejected without mutating the log.
    pub fn append(
        &mut self,
        task_id: u64,
        payload: EventPayload,
        timestamp: DateTime<Utc>,
    ) -> Result<u64> {
        if payload.requires_existing_task() && !self.projection.contains(task_id) {
            return Err(Error::NotFound(task_id));
        }
        if !payload.requires_existing_task() && self.projection.contains(task_id) {
            return Err(Error::Validation(format!("task already exists: {task_id}")));
        }

        let seq = self.log.len() as u64;
        let event = Event::new(seq, task_id, payload, timestamp);
        // apply first: if the projection rejects, the log stays untouched
        self.projection.apply(&event)?;
        self.log.push(event);
        self.next_task_id = self.next_task_id.max(task_id + 1);
        Ok(seq)
    }

    /// Fold `log[from..]` into a fresh projection.
    ///
    /// `replay(0)` is the canonical full rebuild and must always equal the
    /// live projection. A nonzero `from` only succeeds when the suffix is
    /// self-contained (every referenced task is created within it).
    pub fn replay(&self, from: u64) -> Result<Projection> {
        let start = usize::try_from(from)
            .map_err(|_| Error::Validation(format!("replay cursor out of range: {from}")))?;
        if start > self.log.len() {
            return Err(Error::Validation(format!(
                "replay cursor {from} beyond log length {}",
                self.log.len()
            )));
        }
        let mut projection = Projection::new();
        for event in &self.log[start..] {
            projection.apply(event)?;
        }
        Ok(projection)
    }

    /// All events for one task, in append order.
    pub fn events_for_task(&self, task_id: u64) -> Vec<&Event> {
        self.log
            .iter()
            .filter(|event| event.task_id == task_id)
            .collect()
    }

    pub fn events(&self) -> &[Event] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Sequence number the next append will receive.
    pub fn cursor(&self) -> u64 {
        self.log.len() as u64
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Replace log and projection wholesale (snapshot restore). The task-id
    /// counter is recomputed from the restored log so ids stay unique.
    pub fn restore(&mut self, log: Vec<Event>, projection: Projection) {
        self.next_task_id = log
            .iter()
            .map(|event| event.task_id + 1)
            .max()
            .unwrap_or(1);
        self.log = log;
        self.projection = projection;
    }
}
