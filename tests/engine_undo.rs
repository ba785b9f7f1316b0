//! Undo round-trips. Undo appends inverse events; the log only ever grows.

use tasklog::config::Config;
use tasklog::engine::{Engine, EngineOptions};
use tasklog::task::TaskStatus;

fn test_engine() -> Engine {
    Engine::new(
        Config::default(),
        EngineOptions {
            interactive: false,
            test_mode: true,
        },
    )
    .expect("engine")
}

#[test]
fn undo_add_removes_the_task() {
    let mut engine = test_engine();
    engine.handle_line("add Ephemeral");
    assert_eq!(engine.store().projection().len(), 1);
    let events_before = engine.store().len();

    let result = engine.handle_line("undo");
    assert!(result.is_success());
    assert_eq!(result.data["undone"].as_str(), Some("add"));
    assert_eq!(engine.store().projection().len(), 0);
    // append-only: the inverse is a new event, not a rollback
    assert_eq!(engine.store().len(), events_before + 1);
}

#[test]
fn undo_complete_restores_pending_status() {
    let mut engine = test_engine();
    engine.handle_line("add Flip me");
    engine.handle_line("complete 1");
    assert_eq!(
        engine.store().projection().get(1).expect("task").status,
        TaskStatus::Completed
    );

    engine.handle_line("undo");
    assert_eq!(
        engine.store().projection().get(1).expect("task").status,
        TaskStatus::Pending
    );
}

#[test]
fn undo_update_restores_only_touched_fields() {
    let mut engine = test_engine();
    engine.handle_line("add Original title | original details #keep");
    engine.handle_line("update 1 Renamed");

    engine.handle_line("undo");
    let task = engine.store().projection().get(1).expect("task");
    assert_eq!(task.title, "Original title");
    assert_eq!(task.description.as_deref(), Some("original details"));
    assert_eq!(task.tags, vec!["keep".to_string()]);
}

#[test]
fn undo_delete_restores_last_known_state() {
    let mut engine = test_engine();
    engine.handle_line("add Restore me | with details #tagged");
    engine.handle_line("complete 1");
    engine.handle_line("delete 1");
    assert_eq!(engine.store().projection().len(), 0);

    let result = engine.handle_line("undo");
    assert!(result.is_success());
    let task = engine.store().projection().get(1).expect("task");
    assert_eq!(task.title, "Restore me");
    assert_eq!(task.description.as_deref(), Some("with details"));
    assert_eq!(task.tags, vec!["tagged".to_string()]);
    // the deleted task was completed; the restore keeps that status
    assert_eq!(task.status, TaskStatus::Completed);
}

#[test]
fn undo_is_lifo() {
    let mut engine = test_engine();
    engine.handle_line("add First");
    engine.handle_line("add Second");

    engine.handle_line("undo");
    assert!(engine.store().projection().get(2).is_none());
    assert!(engine.store().projection().get(1).is_some());

    engine.handle_line("undo");
    assert_eq!(engine.store().projection().len(), 0);
}

#[test]
fn empty_stack_reports_undo_unavailable_without_mutation() {
    let mut engine = test_engine();
    engine.handle_line("list");
    let events = engine.store().len();

    let result = engine.handle_line("undo");
    assert!(result.is_error());
    assert_eq!(result.data["kind"].as_str(), Some("undo_unavailable"));
    assert_eq!(engine.store().len(), events);
}

#[test]
fn non_reversible_commands_are_not_pushed() {
    let mut engine = test_engine();
    engine.handle_line("add Only");
    engine.handle_line("list");
    engine.handle_line("show 1");
    engine.handle_line("help");
    engine.handle_line("theme unicode");
    engine.handle_line("stats");
    assert_eq!(engine.undo_depth(), 1);

    // the single undoable entry is the add itself
    engine.handle_line("undo");
    assert_eq!(engine.store().projection().len(), 0);
    assert_eq!(engine.undo_depth(), 0);
}

#[test]
fn replay_invariant_survives_undo_chains() {
    let mut engine = test_engine();
    engine.handle_line("add A | d1 #x");
    engine.handle_line("add B");
    engine.handle_line("complete 1");
    engine.handle_line("delete 2");
    for _ in 0..3 {
        engine.handle_line("undo");
        assert!(engine.verify_replay().expect("replay"));
    }
}
