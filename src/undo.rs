//! Undo support based on inverse events.
//!
//! Basic semantics:
//! - Inverses are computed at record time, before execution mutates state
//! - `undo` appends the inverse event(s); the log is never truncated
//! - Only the most recent reversible command can be undone (LIFO)
//! - Undoing an undo is not supported: inverse events do not push entries

use uuid::Uuid;

use crate::event::EventPayload;
use crate::task::{Task, TaskPatch};

/// One undoable command: the inverse event payloads that revert it.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub record_id: Uuid,
    pub intent: String,
    pub task_id: u64,
    /// Inverse events in the order they must be appended.
    pub inverse: Vec<(u64, EventPayload)>,
}

#[derive(Debug, Clone, Default)]
pub struct UndoManager {
    stack: Vec<UndoEntry>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: UndoEntry) {
        self.stack.push(entry);
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drop all entries. Used on snapshot restore, where the tasks an entry
    /// refers to may no longer exist.
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

/// Inverse of `TaskCreated`: delete the task again.
pub fn inverse_of_create(task_id: u64) -> Vec<(u64, EventPayload)> {
    vec![(task_id, EventPayload::Deleted)]
}

/// Inverse of `TaskCompleted`: reopen.
pub fn inverse_of_complete(task_id: u64) -> Vec<(u64, EventPayload)> {
    vec![(task_id, EventPayload::Reopened)]
}

/// Inverse of `TaskReopened`: complete again.
pub fn inverse_of_reopen(task_id: u64) -> Vec<(u64, EventPayload)> {
    vec![(task_id, EventPayload::Completed)]
}

/// Inverse of `TaskUpdated`: a patch carrying the prior values of exactly
/// the fields the original patch touched.
pub fn inverse_of_update(prior: &Task, patch: &TaskPatch) -> Vec<(u64, EventPayload)> {
    let inverse = TaskPatch {
        title: patch.title.as_ref().map(|_| prior.title.clone()),
        description: patch
            .description
            .as_ref()
            .map(|_| prior.description.clone()),
        tags: patch.tags.as_ref().map(|_| prior.tags.clone()),
    };
    vec![(prior.id, EventPayload::Updated { patch: inverse })]
}

/// Inverse of `TaskDeleted`: re-create with the last known field values,
/// status included.
pub fn inverse_of_delete(task: &Task) -> Vec<(u64, EventPayload)> {
    vec![(
        task.id,
        EventPayload::Created {
            title: task.title.clone(),
            description: task.description.clone(),
            tags: task.tags.clone(),
            status: task.status,
        },
    )]
}
