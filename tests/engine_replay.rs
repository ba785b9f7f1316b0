//! Replay determinism: the live projection must equal a full replay of the
//! event log after every command, across every command kind.

use tasklog::config::Config;
use tasklog::engine::{Engine, EngineOptions};

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

fn assert_invariant(engine: &Engine) {
    assert!(
        engine.verify_replay().expect("replay"),
        "projection diverged from replay after {} events",
        engine.store().len()
    );
}

#[test]
fn invariant_holds_after_every_command() {
    let mut engine = test_engine();
    let script = [
        "add Buy milk | 2 liters #errand",
        "add Write report #work",
        "complete 1",
        "update 2 Write quarterly report | due friday",
        "add Water plants",
        "delete 3",
        "undo",
        "undo",
        "complete 2",
        "reopen 2",
        "list",
        "undo",
    ];

    for line in script {
        let result = engine.handle_line(line);
        assert!(
            !result.is_error(),
            "command '{line}' failed: {:?}",
            result.message
        );
        assert_invariant(&engine);
    }
}

#[test]
fn invariant_holds_across_failed_commands() {
    let mut engine = test_engine();
    engine.handle_line("add Only task");

    for line in ["complete 9", "delete 9", "update 9 x", "nonsense", "undo"] {
        engine.handle_line(line);
        assert_invariant(&engine);
    }
}

#[test]
fn failed_commands_do_not_grow_the_log() {
    let mut engine = test_engine();
    engine.handle_line("add Only task");
    let events = engine.store().len();
    let tasks = engine.store().projection().len();

    for line in ["complete 9", "delete 9", "update 9 new title", "reopen 1"] {
        let result = engine.handle_line(line);
        assert!(result.is_error(), "'{line}' should fail");
        assert_eq!(engine.store().len(), events);
        assert_eq!(engine.store().projection().len(), tasks);
    }
}

#[test]
fn add_creates_exactly_one_pending_task_with_unique_id() {
    let mut engine = test_engine();
    let mut seen = std::collections::HashSet::new();

    for i in 0..5 {
        let before = engine.store().projection().len();
        let result = engine.handle_line(&format!("add Task {i}"));
        assert!(result.is_success());
        assert_eq!(engine.store().projection().len(), before + 1);

        let id = result.data["task"]["id"].as_u64().expect("id");
        assert!(seen.insert(id), "task id {id} reused");
        assert_eq!(result.data["task"]["status"].as_str(), Some("pending"));
    }
}

#[test]
fn events_for_task_are_ordered_and_complete() {
    let mut engine = test_engine();
    engine.handle_line("add Tracked");
    engine.handle_line("complete 1");
    engine.handle_line("update 1 Tracked closely");
    engine.handle_line("add Unrelated");

    let events = engine.store().events_for_task(1);
    assert_eq!(events.len(), 3);
    assert!(events.windows(2).all(|pair| pair[0].seq < pair[1].seq));
}
