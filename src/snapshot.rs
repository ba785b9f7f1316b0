//! Whole-state snapshots.
//!
//! A snapshot captures the projection, the full event log, and the CLI
//! state as one unit. Restoring swaps all three atomically, so the replay
//! invariant holds immediately after a load. Unknown names leave live state
//! completely untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::projection::Projection;
use crate::state::CliState;
use crate::store::EventStore;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub cursor: u64,
    projection: Projection,
    log: Vec<Event>,
    cli_state: CliState,
}

impl Snapshot {
    pub fn task_count(&self) -> usize {
        self.projection.len()
    }

    pub fn parts(&self) -> (Vec<Event>, Projection, CliState) {
        (self.log.clone(), self.projection.clone(), self.cli_state)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotManager {
    saved: BTreeMap<String, Snapshot>,
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current engine state under `name`, or a timestamp label
    /// when no name is given. Saving to an existing name replaces it.
    pub fn save(
        &mut self,
        name: Option<String>,
        store: &EventStore,
        cli_state: CliState,
        now: DateTime<Utc>,
    ) -> String {
        let name = name.unwrap_or_else(|| now.format("snap-%Y%m%dT%H%M%S").to_string());
        let snapshot = Snapshot {
            name: name.clone(),
            created_at: now,
            cursor: store.cursor(),
            projection: store.projection().clone(),
            log: store.events().to_vec(),
            cli_state,
        };
        self.saved.insert(name.clone(), snapshot);
        name
    }

    pub fn get(&self, name: &str) -> Result<&Snapshot> {
        self.saved
            .get(name)
            .ok_or_else(|| Error::SnapshotNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.saved.contains_key(name)
    }

    /// Snapshot names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.saved.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventPayload;
    use crate::task::TaskStatus;

    fn store_with_tasks() -> EventStore {
        let mut store = EventStore::new();
        for (id, title) in [(1, "A"), (2, "B")] {
            store
                .append(
                    id,
                    EventPayload::Created {
                        title: title.to_string(),
                        description: None,
                        tags: Vec::new(),
                        status: TaskStatus::Pending,
                    },
                    Utc::now(),
                )
                .expect("create");
        }
        store
    }

    #[test]
    fn save_captures_cursor_and_tasks() {
        let store = store_with_tasks();
        let mut snapshots = SnapshotManager::new();
        let name = snapshots.save(Some("s1".to_string()), &store, CliState::MainMenu, Utc::now());
        assert_eq!(name, "s1");

        let snapshot = snapshots.get("s1").expect("snapshot");
        assert_eq!(snapshot.cursor, 2);
        assert_eq!(snapshot.task_count(), 2);
    }

    #[test]
    fn default_name_derives_from_timestamp() {
        let store = EventStore::new();
        let mut snapshots = SnapshotManager::new();
        let now = "2026-01-02T03:04:05Z".parse().expect("timestamp");
        let name = snapshots.save(None, &store, CliState::MainMenu, now);
        assert_eq!(name, "snap-20260102T030405");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let snapshots = SnapshotManager::new();
        let err = snapshots.get("missing").expect_err("unknown");
        assert!(matches!(err, Error::SnapshotNotFound(_)));
    }

    #[test]
    fn names_are_sorted() {
        let store = EventStore::new();
        let mut snapshots = SnapshotManager::new();
        for name in ["late", "early"] {
            snapshots.save(Some(name.to_string()), &store, CliState::MainMenu, Utc::now());
        }
        assert_eq!(snapshots.names(), vec!["early", "late"]);
    }
}
