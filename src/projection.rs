//! Derived task view, rebuilt by folding the event log.
//!
//! The projection must equal a full replay of the log at all times; event
//! application is deterministic and free of side effects so that the live
//! incremental fold and a from-scratch replay cannot diverge.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::event::{Event, EventPayload};
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Projection {
    tasks: BTreeMap<u64, Task>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single event. Rejects events that do not fit the current
    /// state (duplicate create, unknown task id) without mutating anything.
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        match &event.payload {
            EventPayload::Created {
                title,
                description,
                tags,
                status,
            } => {
                if self.tasks.contains_key(&event.task_id) {
                    return Err(Error::Validation(format!(
                        "task already exists: {}",
                        event.task_id
                    )));
                }
                self.tasks.insert(
                    event.task_id,
                    Task {
                        id: event.task_id,
                        title: title.clone(),
                        description: description.clone(),
                        status: *status,
                        created_at: event.timestamp,
                        updated_at: event.timestamp,
                        tags: tags.clone(),
                    },
                );
            }
            EventPayload::Updated { patch } => {
                let task = self
                    .tasks
                    .get_mut(&event.task_id)
                    .ok_or(Error::NotFound(event.task_id))?;
                if let Some(title) = &patch.title {
                    task.title = title.clone();
                }
                if let Some(description) = &patch.description {
                    task.description = description.clone();
                }
                if let Some(tags) = &patch.tags {
                    task.tags = tags.clone();
                }
                task.updated_at = event.timestamp;
            }
            EventPayload::Deleted => {
                if self.tasks.remove(&event.task_id).is_none() {
                    return Err(Error::NotFound(event.task_id));
                }
            }
            EventPayload::Completed => {
                let task = self
                    .tasks
                    .get_mut(&event.task_id)
                    .ok_or(Error::NotFound(event.task_id))?;
                task.status = TaskStatus::Completed;
                task.updated_at = event.timestamp;
            }
            EventPayload::Reopened => {
                let task = self
                    .tasks
                    .get_mut(&event.task_id)
                    .ok_or(Error::NotFound(event.task_id))?;
                task.status = TaskStatus::Pending;
                task.updated_at = event.timestamp;
            }
        }

        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Tasks in ascending id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPatch;
    use chrono::Utc;

    fn created(seq: u64, task_id: u64, title: &str) -> Event {
        Event::new(
            seq,
            task_id,
            EventPayload::Created {
                title: title.to_string(),
                description: None,
                tags: Vec::new(),
                status: TaskStatus::Pending,
            },
            Utc::now(),
        )
    }

    #[test]
    fn create_then_complete() {
        let mut projection = Projection::new();
        projection.apply(&created(0, 1, "Buy milk")).expect("create");
        projection
            .apply(&Event::new(1, 1, EventPayload::Completed, Utc::now()))
            .expect("complete");

        let task = projection.get(1).expect("task");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.title, "Buy milk");
    }

    #[test]
    fn duplicate_create_is_rejected_without_mutation() {
        let mut projection = Projection::new();
        projection.apply(&created(0, 1, "First")).expect("create");
        let err = projection.apply(&created(1, 1, "Second")).expect_err("dup");
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(projection.get(1).expect("task").title, "First");
    }

    #[test]
    fn unknown_task_id_is_rejected() {
        let mut projection = Projection::new();
        let err = projection
            .apply(&Event::new(0, 7, EventPayload::Deleted, Utc::now()))
            .expect_err("missing");
        assert!(matches!(err, Error::NotFound(7)));
        assert!(projection.is_empty());
    }

    #[test]
    fn update_patch_touches_only_named_fields() {
        let mut projection = Projection::new();
        let mut create = created(0, 1, "Title");
        if let EventPayload::Created { description, tags, .. } = &mut create.payload {
            *description = Some("keep me".to_string());
            *tags = vec!["infra".to_string()];
        }
        projection.apply(&create).expect("create");

        let patch = TaskPatch {
            title: Some("New title".to_string()),
            ..TaskPatch::default()
        };
        projection
            .apply(&Event::new(1, 1, EventPayload::Updated { patch }, Utc::now()))
            .expect("update");

        let task = projection.get(1).expect("task");
        assert_eq!(task.title, "New title");
        assert_eq!(task.description.as_deref(), Some("keep me"));
        assert_eq!(task.tags, vec!["infra".to_string()]);
    }

    #[test]
    fn update_can_clear_description() {
        let mut projection = Projection::new();
        let mut create = created(0, 1, "Title");
        if let EventPayload::Created { description, .. } = &mut create.payload {
            *description = Some("old".to_string());
        }
        projection.apply(&create).expect("create");

        let patch = TaskPatch {
            description: Some(None),
            ..TaskPatch::default()
        };
        projection
            .apply(&Event::new(1, 1, EventPayload::Updated { patch }, Utc::now()))
            .expect("update");

        assert!(projection.get(1).expect("task").description.is_none());
    }
}
