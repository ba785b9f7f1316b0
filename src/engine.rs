//! Engine context: the explicit state threaded through the pipeline.
//!
//! One `Engine` owns the event store, state machine, history, undo stack,
//! macro engine, snapshot table, plugin registry, session stats, and clock.
//! There are no globals; tests construct isolated engines.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::EventPayload;
use crate::history::CommandHistory;
use crate::macros::MacroEngine;
use crate::output::{CommandResult, Theme};
use crate::parser::{self, ParsedCommand};
use crate::pipeline;
use crate::plugin::PluginRegistry;
use crate::snapshot::SnapshotManager;
use crate::state::{CliState, StateMachine};
use crate::store::EventStore;
use crate::task::TaskStatus;
use crate::undo::{self, UndoEntry, UndoManager};

/// Counters for the session summary.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SessionStats {
    pub tasks_created: u64,
    pub tasks_completed: u64,
    pub commands_executed: u64,
}

/// Time source. The logical clock starts at a fixed epoch and advances one
/// second per reading, which makes `--test-mode` output reproducible.
#[derive(Debug, Clone)]
pub enum Clock {
    System,
    Logical { next: DateTime<Utc> },
}

impl Clock {
    pub fn system() -> Self {
        Clock::System
    }

    pub fn logical() -> Self {
        // 2000-01-01T00:00:00Z
        let epoch = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(946_684_800);
        Clock::Logical { next: epoch }
    }

    pub fn now(&mut self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Logical { next } => {
                let now = *next;
                *next = now + Duration::seconds(1);
                now
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Interactive sessions route destructive commands through the
    /// confirmation dialog; non-interactive ones auto-accept.
    pub interactive: bool,
    /// Deterministic output: logical clock, no prompts.
    pub test_mode: bool,
}

/// A destructive command parked while its confirmation dialog is open.
#[derive(Debug, Clone)]
struct PendingAction {
    command: ParsedCommand,
    line: String,
}

pub struct Engine {
    config: Config,
    store: EventStore,
    state: StateMachine,
    history: CommandHistory,
    undo: UndoManager,
    macros: MacroEngine,
    snapshots: SnapshotManager,
    plugins: PluginRegistry,
    theme: Theme,
    clock: Clock,
    stats: SessionStats,
    options: EngineOptions,
    pending: Option<PendingAction>,
    playback_depth: usize,
    exit_requested: bool,
}

impl Engine {
    pub fn new(config: Config, options: EngineOptions) -> Result<Self> {
        let theme: Theme = config.output.theme.parse()?;
        let clock = if options.test_mode {
            Clock::logical()
        } else {
            Clock::system()
        };
        Ok(Self {
            config,
            store: EventStore::new(),
            state: StateMachine::new(),
            history: CommandHistory::new(),
            undo: UndoManager::new(),
            macros: MacroEngine::new(),
            snapshots: SnapshotManager::new(),
            plugins: PluginRegistry::new(),
            theme,
            clock,
            stats: SessionStats::default(),
            options,
            pending: None,
            playback_depth: 0,
            exit_requested: false,
        })
    }

    /// Run one raw input line through the full middleware pipeline.
    pub fn handle_line(&mut self, raw: &str) -> CommandResult {
        pipeline::dispatch(self, raw)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.state
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn macros(&self) -> &MacroEngine {
        &self.macros
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Plugin registration point. Must be called before the first dispatch.
    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    pub(crate) fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub(crate) fn clock_now(&mut self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn note_history(&mut self, record: crate::history::CommandRecord) {
        self.history.push(record);
    }

    pub(crate) fn note_executed(&mut self) {
        self.stats.commands_executed += 1;
    }

    /// Session summary payload for the exit flow.
    pub fn session_summary(&self) -> serde_json::Value {
        json!({ "summary": self.stats })
    }

    /// Execute a classified command. Called by the pipeline's execute stage.
    pub(crate) fn execute_parsed(
        &mut self,
        command: ParsedCommand,
        line: &str,
    ) -> Result<CommandResult> {
        if self.state.in_confirmation() {
            if let ParsedCommand::Confirm { accepted } = command {
                return self.resolve_pending(accepted);
            }
            return Err(Error::Validation(
                "confirmation pending: answer yes or no".to_string(),
            ));
        }
        if let ParsedCommand::Confirm { .. } = command {
            return Err(Error::Validation("nothing to confirm".to_string()));
        }

        if self.needs_confirmation(&command) {
            return self.park_for_confirmation(command, line);
        }

        self.run_and_capture(command, line)
    }

    fn needs_confirmation(&self, command: &ParsedCommand) -> bool {
        if !self.options.interactive || self.options.test_mode || self.playback_depth > 0 {
            return false;
        }
        match command {
            ParsedCommand::Delete { .. } => true,
            ParsedCommand::SnapshotLoad { .. } => true,
            ParsedCommand::MacroStop { name } => {
                self.macros.is_recording() && self.macros.contains(name)
            }
            _ => false,
        }
    }

    fn park_for_confirmation(
        &mut self,
        command: ParsedCommand,
        line: &str,
    ) -> Result<CommandResult> {
        self.state.enter_confirmation()?;
        let intent = command.intent();
        let prompt = match &command {
            ParsedCommand::Delete { id } => format!("Delete task {id}? (yes/no)"),
            ParsedCommand::SnapshotLoad { name } => {
                format!("Replace live state with snapshot '{name}'? (yes/no)")
            }
            ParsedCommand::MacroStop { name } => {
                format!("Overwrite existing macro '{name}'? (yes/no)")
            }
            _ => "Confirm? (yes/no)".to_string(),
        };
        self.pending = Some(PendingAction {
            command,
            line: line.to_string(),
        });
        Ok(CommandResult::confirm(json!({ "action": intent }), prompt))
    }

    fn resolve_pending(&mut self, accepted: bool) -> Result<CommandResult> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| Error::Validation("nothing to confirm".to_string()))?;
        self.state.resolve_confirmation()?;
        if !accepted {
            return Ok(CommandResult::success(
                json!({ "cancelled": pending.command.intent() }),
                Some("Cancelled".to_string()),
            ));
        }
        let PendingAction { command, line } = pending;
        self.run_and_capture(command, &line)
    }

    /// Run a command and, on success, capture its line into any active
    /// macro recording. Macro-control commands, confirmations, and `exit`
    /// are never captured.
    fn run_and_capture(&mut self, command: ParsedCommand, line: &str) -> Result<CommandResult> {
        let capturable = !command.is_macro_control()
            && !matches!(
                command,
                ParsedCommand::Exit | ParsedCommand::Confirm { .. }
            );
        let result = self.run_command(command)?;
        if capturable && result.is_success() {
            self.macros.capture(line);
        }
        Ok(result)
    }

    fn run_command(&mut self, command: ParsedCommand) -> Result<CommandResult> {
        match command {
            ParsedCommand::Add {
                title,
                description,
                tags,
            } => self.with_transient(CliState::AddingTask, |engine| {
                engine.cmd_add(title, description, tags)
            }),
            ParsedCommand::List { filter } => self.cmd_list(filter),
            ParsedCommand::Show { id } => self.cmd_show(id),
            ParsedCommand::Update { id, patch } => {
                self.with_transient(CliState::UpdatingTask, |engine| {
                    engine.cmd_update(id, patch)
                })
            }
            ParsedCommand::Delete { id } => {
                self.with_transient(CliState::DeletingTask, |engine| engine.cmd_delete(id))
            }
            ParsedCommand::Complete { id } => self.cmd_complete(id),
            ParsedCommand::Reopen { id } => self.cmd_reopen(id),
            ParsedCommand::Undo => self.cmd_undo(),
            ParsedCommand::Help { topic } => self.cmd_help(topic),
            ParsedCommand::Theme { name } => self.cmd_theme(name),
            ParsedCommand::SnapshotSave { name } => self.cmd_snapshot_save(name),
            ParsedCommand::SnapshotLoad { name } => self.cmd_snapshot_load(&name),
            ParsedCommand::SnapshotList => Ok(CommandResult::success(
                json!({ "snapshots": self.snapshots.names() }),
                None,
            )),
            ParsedCommand::MacroRecord => self.cmd_macro_record(),
            ParsedCommand::MacroStop { name } => self.cmd_macro_stop(&name),
            ParsedCommand::MacroPlay { name } => self.cmd_macro_play(&name),
            ParsedCommand::MacroList => Ok(CommandResult::success(
                json!({ "macros": self.macros.names() }),
                None,
            )),
            ParsedCommand::History { limit } => self.cmd_history(limit),
            ParsedCommand::Stats => Ok(CommandResult::success(self.session_summary(), None)),
            ParsedCommand::Exit => self.cmd_exit(),
            ParsedCommand::Confirm { .. } => {
                Err(Error::Validation("nothing to confirm".to_string()))
            }
        }
    }

    /// Enter a transient interaction state for the duration of one command.
    fn with_transient<F>(&mut self, state: CliState, f: F) -> Result<CommandResult>
    where
        F: FnOnce(&mut Self) -> Result<CommandResult>,
    {
        self.state.transition(state)?;
        let result = f(self);
        // the pair (state, MainMenu) is always in the table
        let _ = self.state.transition(CliState::MainMenu);
        result
    }

    fn cmd_add(
        &mut self,
        title: String,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Result<CommandResult> {
        let id = self.store.peek_next_task_id();
        let now = self.clock.now();
        self.store.append(
            id,
            EventPayload::Created {
                title: title.clone(),
                description,
                tags,
                status: TaskStatus::Pending,
            },
            now,
        )?;
        self.undo.push(UndoEntry {
            record_id: Uuid::new_v4(),
            intent: "add".to_string(),
            task_id: id,
            inverse: undo::inverse_of_create(id),
        });
        self.stats.tasks_created += 1;

        let task = self.store.projection().get(id);
        Ok(CommandResult::success(
            json!({ "task": task }),
            Some(format!("Added task {id}: {title}")),
        ))
    }

    fn cmd_list(&mut self, filter: crate::parser::ListFilter) -> Result<CommandResult> {
        use crate::parser::ListFilter;
        let tasks: Vec<&crate::task::Task> = self
            .store
            .projection()
            .tasks()
            .filter(|task| match filter {
                ListFilter::All => true,
                ListFilter::Pending => task.status == TaskStatus::Pending,
                ListFilter::Completed => task.status == TaskStatus::Completed,
            })
            .collect();
        let total = tasks.len();
        let data = json!({
            "tasks": tasks,
            "total": total,
            "filter": filter.as_str(),
        });
        Ok(CommandResult::success(data, None))
    }

    fn cmd_show(&mut self, id: u64) -> Result<CommandResult> {
        let task = self.store.projection().get(id).ok_or(Error::NotFound(id))?;
        let events = self.store.events_for_task(id).len();
        Ok(CommandResult::success(
            json!({ "task": task, "events": events }),
            None,
        ))
    }

    fn cmd_update(&mut self, id: u64, patch: crate::task::TaskPatch) -> Result<CommandResult> {
        let prior = self
            .store
            .projection()
            .get(id)
            .ok_or(Error::NotFound(id))?
            .clone();
        let inverse = undo::inverse_of_update(&prior, &patch);
        let now = self.clock.now();
        self.store
            .append(id, EventPayload::Updated { patch }, now)?;
        self.undo.push(UndoEntry {
            record_id: Uuid::new_v4(),
            intent: "update".to_string(),
            task_id: id,
            inverse,
        });

        let task = self.store.projection().get(id);
        Ok(CommandResult::success(
            json!({ "task": task }),
            Some(format!("Updated task {id}")),
        ))
    }

    fn cmd_delete(&mut self, id: u64) -> Result<CommandResult> {
        let prior = self
            .store
            .projection()
            .get(id)
            .ok_or(Error::NotFound(id))?
            .clone();
        let now = self.clock.now();
        self.store.append(id, EventPayload::Deleted, now)?;
        self.undo.push(UndoEntry {
            record_id: Uuid::new_v4(),
            intent: "delete".to_string(),
            task_id: id,
            inverse: undo::inverse_of_delete(&prior),
        });

        Ok(CommandResult::success(
            json!({ "task_id": id }),
            Some(format!("Deleted task {id}: {}", prior.title)),
        ))
    }

    fn cmd_complete(&mut self, id: u64) -> Result<CommandResult> {
        let now = self.clock.now();
        self.store.append(id, EventPayload::Completed, now)?;
        self.undo.push(UndoEntry {
            record_id: Uuid::new_v4(),
            intent: "complete".to_string(),
            task_id: id,
            inverse: undo::inverse_of_complete(id),
        });
        self.stats.tasks_completed += 1;

        let task = self.store.projection().get(id);
        Ok(CommandResult::success(
            json!({ "task": task }),
            Some(format!("Completed task {id}")),
        ))
    }

    fn cmd_reopen(&mut self, id: u64) -> Result<CommandResult> {
        let now = self.clock.now();
        self.store.append(id, EventPayload::Reopened, now)?;
        self.undo.push(UndoEntry {
            record_id: Uuid::new_v4(),
            intent: "reopen".to_string(),
            task_id: id,
            inverse: undo::inverse_of_reopen(id),
        });

        let task = self.store.projection().get(id);
        Ok(CommandResult::success(
            json!({ "task": task }),
            Some(format!("Reopened task {id}")),
        ))
    }

    fn cmd_undo(&mut self) -> Result<CommandResult> {
        let entry = self.undo.pop().ok_or(Error::UndoUnavailable)?;
        let mut appended = 0u64;
        for (task_id, payload) in &entry.inverse {
            let now = self.clock.now();
            self.store.append(*task_id, payload.clone(), now)?;
            appended += 1;
        }

        Ok(CommandResult::success(
            json!({
                "undone": entry.intent,
                "task_id": entry.task_id,
                "events_appended": appended,
            }),
            Some(format!("Undid {} (task {})", entry.intent, entry.task_id)),
        ))
    }

    fn cmd_help(&mut self, topic: Option<String>) -> Result<CommandResult> {
        match topic {
            Some(topic) => {
                let lower = topic.to_lowercase();
                if let Some(entry) = parser::help_for(&lower) {
                    return Ok(CommandResult::success(
                        json!({ "commands": [entry] }),
                        None,
                    ));
                }
                if let Some(plugin) = self.plugins.verb(&lower) {
                    let entry = format!("{} - {}", plugin.verb(), plugin.help());
                    return Ok(CommandResult::success(
                        json!({ "commands": [entry] }),
                        None,
                    ));
                }
                Err(Error::Validation(format!("no help for '{topic}'")))
            }
            None => {
                let mut commands = parser::help_lines();
                for verb in self.plugins.verb_names() {
                    if let Some(plugin) = self.plugins.verb(&verb) {
                        commands.push(format!("{} - {}", verb, plugin.help()));
                    }
                }
                Ok(CommandResult::success(json!({ "commands": commands }), None))
            }
        }
    }

    fn cmd_theme(&mut self, name: Option<String>) -> Result<CommandResult> {
        match name {
            None => Ok(CommandResult::success(
                json!({
                    "theme": self.theme.as_str(),
                    "themes": crate::output::THEMES,
                }),
                Some(format!("Theme: {}", self.theme.as_str())),
            )),
            Some(name) => {
                let theme: Theme = name.parse()?;
                self.theme = theme;
                Ok(CommandResult::success(
                    json!({ "theme": theme.as_str() }),
                    Some(format!("Theme set to {}", theme.as_str())),
                ))
            }
        }
    }

    fn cmd_snapshot_save(&mut self, name: Option<String>) -> Result<CommandResult> {
        let now = self.clock.now();
        let name = self
            .snapshots
            .save(name, &self.store, self.state.current(), now);
        Ok(CommandResult::success(
            json!({
                "name": name,
                "events": self.store.cursor(),
                "tasks": self.store.projection().len(),
            }),
            Some(format!("Saved snapshot '{name}'")),
        ))
    }

    fn cmd_snapshot_load(&mut self, name: &str) -> Result<CommandResult> {
        // fetch first: an unknown name must leave live state untouched
        let (log, projection, cli_state) = self.snapshots.get(name)?.parts();
        self.store.restore(log, projection);
        self.state.restore(cli_state);
        self.pending = None;
        // entries and buffers may reference tasks that no longer exist
        self.undo.clear();
        self.macros.abort_recording();

        Ok(CommandResult::success(
            json!({
                "name": name,
                "tasks": self.store.projection().len(),
                "events": self.store.cursor(),
            }),
            Some(format!("Restored snapshot '{name}'")),
        ))
    }

    fn cmd_macro_record(&mut self) -> Result<CommandResult> {
        self.macros.start_recording()?;
        Ok(CommandResult::success(
            json!({ "recording": true }),
            Some("Recording started".to_string()),
        ))
    }

    fn cmd_macro_stop(&mut self, name: &str) -> Result<CommandResult> {
        let now = self.clock.now();
        // interactive overwrites were already confirmed via the dialog;
        // non-interactive sessions auto-accept
        let count = self.macros.stop_recording(name, true, now)?;
        Ok(CommandResult::success(
            json!({ "name": name, "commands": count }),
            Some(format!("Saved macro '{name}' ({count} commands)")),
        ))
    }

    fn cmd_macro_play(&mut self, name: &str) -> Result<CommandResult> {
        if self.macros.is_recording() {
            return Err(Error::Validation(
                "cannot play a macro while recording".to_string(),
            ));
        }
        if self.playback_depth > 0 {
            return Err(Error::Validation(
                "nested macro playback is not supported".to_string(),
            ));
        }
        let commands = self.macros.get(name)?.commands.clone();

        self.playback_depth += 1;
        let mut failure: Option<Error> = None;
        let mut steps = 0usize;
        for (index, command) in commands.iter().enumerate() {
            let result = pipeline::dispatch(self, command);
            if result.is_error() {
                // applied steps stay applied: no automatic rollback
                failure = Some(Error::MacroPlayback {
                    step: index,
                    command: command.clone(),
                    cause: result.message.unwrap_or_else(|| "unknown error".to_string()),
                });
                break;
            }
            steps += 1;
        }
        self.playback_depth -= 1;

        if let Some(err) = failure {
            return Err(err);
        }
        Ok(CommandResult::success(
            json!({ "name": name, "steps": steps }),
            Some(format!("Played macro '{name}' ({steps} steps)")),
        ))
    }

    fn cmd_history(&mut self, limit: Option<usize>) -> Result<CommandResult> {
        let limit = limit.unwrap_or(self.config.history.default_limit);
        let entries: Vec<&crate::history::CommandRecord> = self.history.recent(limit);
        let data = json!({
            "entries": entries,
            "total": self.history.len(),
        });
        Ok(CommandResult::success(data, None))
    }

    fn cmd_exit(&mut self) -> Result<CommandResult> {
        self.state.transition(CliState::Exiting)?;
        self.exit_requested = true;
        Ok(CommandResult::success(
            self.session_summary(),
            Some("Goodbye".to_string()),
        ))
    }

    /// Verify the replay invariant: the live projection must equal a full
    /// replay of the log. Exposed for tests and debugging.
    pub fn verify_replay(&self) -> Result<bool> {
        let replayed = self.store.replay(0)?;
        Ok(&replayed == self.store.projection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(Config::default(), EngineOptions { interactive: false, test_mode: true })
            .expect("engine")
    }

    #[test]
    fn logical_clock_is_deterministic() {
        let mut a = Clock::logical();
        let mut b = Clock::logical();
        assert_eq!(a.now(), b.now());
        assert_eq!(a.now(), b.now());
        assert!(a.now() > Clock::logical().now());
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut engine = engine();
        let first = engine.handle_line("add First");
        let second = engine.handle_line("add Second");
        assert!(first.is_success());
        assert_eq!(first.data["task"]["id"].as_u64(), Some(1));
        assert_eq!(second.data["task"]["id"].as_u64(), Some(2));
        assert_eq!(engine.stats().tasks_created, 2);
    }

    #[test]
    fn confirmation_flow_executes_on_yes() {
        let config = Config::default();
        let mut engine =
            Engine::new(config, EngineOptions { interactive: true, test_mode: false })
                .expect("engine");
        engine.handle_line("add Victim");

        let prompt = engine.handle_line("delete 1");
        assert_eq!(prompt.status, "confirm");
        assert!(engine.state_machine().in_confirmation());

        // other commands are rejected while the dialog is open
        let blocked = engine.handle_line("add Another");
        assert!(blocked.is_error());

        let done = engine.handle_line("yes");
        assert!(done.is_success());
        assert_eq!(engine.store().projection().len(), 0);
        assert!(!engine.state_machine().in_confirmation());
    }

    #[test]
    fn confirmation_no_cancels_without_mutation() {
        let mut engine =
            Engine::new(Config::default(), EngineOptions { interactive: true, test_mode: false })
                .expect("engine");
        engine.handle_line("add Survivor");
        engine.handle_line("delete 1");
        let cancelled = engine.handle_line("no");
        assert!(cancelled.is_success());
        assert_eq!(engine.store().projection().len(), 1);
    }

    #[test]
    fn exit_sets_flag_and_reports_summary() {
        let mut engine = engine();
        engine.handle_line("add One");
        engine.handle_line("complete 1");
        let result = engine.handle_line("exit");
        assert!(result.is_success());
        assert!(engine.exit_requested());
        assert_eq!(result.data["summary"]["tasks_created"].as_u64(), Some(1));
        assert_eq!(result.data["summary"]["tasks_completed"].as_u64(), Some(1));
    }
}
