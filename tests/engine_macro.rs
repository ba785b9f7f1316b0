//! Macro recording and playback through the live pipeline.

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

#[test]
fn playback_reproduces_the_recorded_commands() {
    let mut recorder = test_engine();
    recorder.handle_line("macro record");
    recorder.handle_line("add A");
    recorder.handle_line("add B");
    let stopped = recorder.handle_line("macro stop pair");
    assert!(stopped.is_success());
    assert_eq!(stopped.data["commands"].as_u64(), Some(2));

    // playing from the same engine after deleting both tasks restores them
    recorder.handle_line("delete 1");
    recorder.handle_line("delete 2");
    assert_eq!(recorder.store().projection().len(), 0);

    let played = recorder.handle_line("macro play pair");
    assert!(played.is_success());
    assert_eq!(played.data["steps"].as_u64(), Some(2));

    let titles: Vec<String> = recorder
        .store()
        .projection()
        .tasks()
        .map(|task| task.title.clone())
        .collect();
    assert_eq!(titles, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn playback_from_identical_initial_state_is_faithful() {
    // record on one engine
    let mut recorder = test_engine();
    recorder.handle_line("macro record");
    recorder.handle_line("add A");
    recorder.handle_line("add B");
    recorder.handle_line("macro stop pair");

    let recorded_count = recorder.store().projection().len();

    // replay the same lines on a fresh engine: same events, same count
    let mut fresh = test_engine();
    for line in ["add A", "add B"] {
        fresh.handle_line(line);
    }
    assert_eq!(fresh.store().projection().len(), recorded_count);
    assert_eq!(
        fresh.store().events().len(),
        recorder
            .store()
            .events()
            .iter()
            .filter(|event| event.task_id <= 2)
            .count()
    );
}

#[test]
fn recording_mutual_exclusion_preserves_the_buffer() {
    let mut engine = test_engine();
    engine.handle_line("macro record");
    engine.handle_line("add Captured");

    let rejected = engine.handle_line("macro record");
    assert!(rejected.is_error());
    assert_eq!(
        rejected.data["kind"].as_str(),
        Some("macro_recording_active")
    );

    // the original buffer is intact
    let stopped = engine.handle_line("macro stop survived");
    assert_eq!(stopped.data["commands"].as_u64(), Some(1));
}

#[test]
fn macro_control_commands_are_not_captured() {
    let mut engine = test_engine();
    engine.handle_line("macro record");
    engine.handle_line("add Real");
    engine.handle_line("macro list");
    engine.handle_line("macro stop only-real");

    let def = engine.macros().get("only-real").expect("macro");
    assert_eq!(def.commands, vec!["add Real".to_string()]);
}

#[test]
fn playback_halts_at_first_failure_and_does_not_roll_back() {
    let mut engine = test_engine();
    engine.handle_line("add Victim");
    engine.handle_line("macro record");
    engine.handle_line("add Step one");
    engine.handle_line("delete 1");
    engine.handle_line("add Step three");
    engine.handle_line("macro stop brittle");

    // recording already deleted task 1, so on playback the middle step
    // ("delete 1") targets a missing task and fails
    let before_play = engine.store().projection().len();

    let result = engine.handle_line("macro play brittle");
    assert!(result.is_error());
    assert_eq!(result.data["kind"].as_str(), Some("macro_playback_error"));
    // failing step index + command are reported
    assert_eq!(result.data["details"]["step"].as_u64(), Some(1));
    assert_eq!(result.data["details"]["command"].as_str(), Some("delete 1"));

    // documented decision: step 0 ("add Step one") stays applied and is
    // not rolled back; step 2 never ran
    assert_eq!(engine.store().projection().len(), before_play + 1);
    let step_one_count = engine
        .store()
        .projection()
        .tasks()
        .filter(|task| task.title == "Step one")
        .count();
    let step_three_count = engine
        .store()
        .projection()
        .tasks()
        .filter(|task| task.title == "Step three")
        .count();
    assert_eq!(step_one_count, 2);
    assert_eq!(step_three_count, 1);
}

#[test]
fn playing_an_unknown_macro_is_an_error() {
    let mut engine = test_engine();
    let result = engine.handle_line("macro play ghost");
    assert!(result.is_error());
    assert_eq!(result.data["kind"].as_str(), Some("macro_not_found"));
}

#[test]
fn play_while_recording_is_rejected() {
    let mut engine = test_engine();
    engine.handle_line("macro record");
    engine.handle_line("macro stop noop");
    engine.handle_line("macro record");

    let result = engine.handle_line("macro play noop");
    assert!(result.is_error());

    // recording still active and intact
    let stopped = engine.handle_line("macro stop after");
    assert!(stopped.is_success());
}

#[test]
fn macro_list_is_sorted() {
    let mut engine = test_engine();
    for name in ["zz", "aa"] {
        engine.handle_line("macro record");
        engine.handle_line(&format!("macro stop {name}"));
    }
    let result = engine.handle_line("macro list");
    let names: Vec<&str> = result.data["macros"]
        .as_array()
        .expect("names")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(names, vec!["aa", "zz"]);
}
