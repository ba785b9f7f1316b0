//! Middleware pipeline.
//!
//! Every raw input line passes through a fixed, ordered chain of stages:
//! normalize, classify, guard, validate, execute, analytics, render. A stage
//! either forwards the (possibly transformed) context or halts with an
//! error; any halt before the execute stage leaves engine state untouched.
//! Errors never escape the pipeline boundary: `dispatch` converts them into
//! error-status results.

use std::time::Instant;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::history::{CommandRecord, Outcome};
use crate::output::{self, CommandResult};
use crate::parser::{self, ParsedCommand};
use crate::task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Per-command context threaded through the stages.
#[derive(Debug)]
pub struct PipelineContext {
    pub raw: String,
    pub normalized: String,
    pub command: Option<ParsedCommand>,
    /// Verb and argument text for a plugin-claimed verb.
    pub plugin: Option<(String, String)>,
    pub result: Option<CommandResult>,
    started: Instant,
}

impl PipelineContext {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: String::new(),
            command: None,
            plugin: None,
            result: None,
            started: Instant::now(),
        }
    }

    fn intent(&self) -> String {
        if let Some(command) = &self.command {
            return command.intent().to_string();
        }
        if let Some((verb, _)) = &self.plugin {
            return verb.clone();
        }
        "unknown".to_string()
    }
}

/// One link in the processing chain.
pub trait Middleware {
    fn name(&self) -> &'static str;

    fn handle(&self, ctx: &mut PipelineContext, engine: &mut Engine) -> Result<Flow>;
}

/// Whitespace, case, and synonym normalization.
struct InputNormalizer;

impl Middleware for InputNormalizer {
    fn name(&self) -> &'static str {
        "input_normalizer"
    }

    fn handle(&self, ctx: &mut PipelineContext, _engine: &mut Engine) -> Result<Flow> {
        let collapsed = ctx.raw.split_whitespace().collect::<Vec<_>>().join(" ");
        ctx.normalized = match collapsed.split_once(' ') {
            Some((verb, rest)) => {
                let verb = verb.to_lowercase();
                let canonical = parser::canonical_verb(&verb).unwrap_or(verb.as_str());
                format!("{canonical} {rest}")
            }
            None => {
                let verb = collapsed.to_lowercase();
                parser::canonical_verb(&verb).unwrap_or(verb.as_str()).to_string()
            }
        };
        Ok(Flow::Continue)
    }
}

/// Maps normalized input to a typed command, consulting plugin verbs first.
struct IntentClassifier;

impl Middleware for IntentClassifier {
    fn name(&self) -> &'static str {
        "intent_classifier"
    }

    fn handle(&self, ctx: &mut PipelineContext, engine: &mut Engine) -> Result<Flow> {
        let (verb, args) = match ctx.normalized.split_once(' ') {
            Some((verb, args)) => (verb, args),
            None => (ctx.normalized.as_str(), ""),
        };
        if engine.plugins().verb(verb).is_some() {
            ctx.plugin = Some((verb.to_string(), args.to_string()));
            return Ok(Flow::Continue);
        }
        let command = parser::parse(&ctx.normalized, &engine.config().parser)?;
        ctx.command = Some(command);
        Ok(Flow::Continue)
    }
}

/// Rejects control characters and oversized input.
struct SecurityGuard;

impl Middleware for SecurityGuard {
    fn name(&self) -> &'static str {
        "security_guard"
    }

    fn handle(&self, ctx: &mut PipelineContext, engine: &mut Engine) -> Result<Flow> {
        let limits = &engine.config().limits;
        if ctx.raw.len() > limits.input_max_bytes {
            return Err(Error::Security(format!(
                "input exceeds {} bytes",
                limits.input_max_bytes
            )));
        }
        if ctx
            .raw
            .chars()
            .any(|ch| ch.is_control() && ch != '\t')
        {
            return Err(Error::Security(
                "control characters are not allowed".to_string(),
            ));
        }
        Ok(Flow::Continue)
    }
}

/// Field-level checks plus task-id existence, then plugin checks.
struct Validation;

impl Middleware for Validation {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn handle(&self, ctx: &mut PipelineContext, engine: &mut Engine) -> Result<Flow> {
        let Some(command) = &ctx.command else {
            return Ok(Flow::Continue);
        };
        let limits = &engine.config().limits;
        let projection = engine.store().projection();

        match command {
            ParsedCommand::Add {
                title,
                description,
                tags,
            } => {
                task::validate_title(title, limits)?;
                if let Some(description) = description {
                    task::validate_description(description, limits)?;
                }
                task::validate_tags(tags, limits)?;
            }
            ParsedCommand::Update { id, patch } => {
                task::validate_patch(patch, limits)?;
                if !projection.contains(*id) {
                    return Err(Error::NotFound(*id));
                }
            }
            ParsedCommand::Complete { id } => {
                let task = projection.get(*id).ok_or(Error::NotFound(*id))?;
                if task.status == crate::task::TaskStatus::Completed {
                    return Err(Error::Validation(format!(
                        "task {id} is already completed"
                    )));
                }
            }
            ParsedCommand::Reopen { id } => {
                let task = projection.get(*id).ok_or(Error::NotFound(*id))?;
                if task.status == crate::task::TaskStatus::Pending {
                    return Err(Error::Validation(format!("task {id} is not completed")));
                }
            }
            ParsedCommand::Show { id } | ParsedCommand::Delete { id } => {
                if !projection.contains(*id) {
                    return Err(Error::NotFound(*id));
                }
            }
            ParsedCommand::MacroStop { name }
            | ParsedCommand::MacroPlay { name }
            | ParsedCommand::SnapshotLoad { name } => {
                validate_name(name)?;
            }
            ParsedCommand::SnapshotSave { name: Some(name) } => {
                validate_name(name)?;
            }
            _ => {}
        }

        for check in engine.plugins().checks() {
            if let Err(err) = check.check(command, projection) {
                tracing::debug!(check = check.name(), error = %err, "plugin check rejected");
                return Err(err);
            }
        }
        Ok(Flow::Continue)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.chars().count() > 64 {
        return Err(Error::Validation(
            "name exceeds 64 characters".to_string(),
        ));
    }
    Ok(())
}

/// Runs the command against the engine. The only stage that mutates state.
struct Execute;

impl Middleware for Execute {
    fn name(&self) -> &'static str {
        "execute"
    }

    fn handle(&self, ctx: &mut PipelineContext, engine: &mut Engine) -> Result<Flow> {
        if let Some((verb, args)) = ctx.plugin.clone() {
            let plugin = engine
                .plugins()
                .verb(&verb)
                .ok_or_else(|| Error::Validation(format!("unknown verb '{verb}'")))?;
            ctx.result = Some(plugin.execute(&args, engine)?);
            return Ok(Flow::Continue);
        }

        let command = ctx
            .command
            .clone()
            .ok_or_else(|| Error::Validation("empty command".to_string()))?;
        let normalized = ctx.normalized.clone();
        ctx.result = Some(engine.execute_parsed(command, &normalized)?);
        Ok(Flow::Continue)
    }
}

/// Records timing and usage metadata. Never halts the chain.
struct Analytics;

impl Middleware for Analytics {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn handle(&self, ctx: &mut PipelineContext, engine: &mut Engine) -> Result<Flow> {
        let intent = ctx.intent();
        let status = ctx
            .result
            .as_ref()
            .map(|result| result.status.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let elapsed_ms = ctx.started.elapsed().as_millis() as u64;
        tracing::debug!(%intent, %status, elapsed_ms, "command processed");

        let outcome = match status.as_str() {
            "success" => Outcome::success(),
            other => Outcome {
                status: other.to_string(),
                message: ctx.result.as_ref().and_then(|r| r.message.clone()),
            },
        };
        let now = engine.clock_now();
        let mut record = CommandRecord::new(ctx.raw.trim(), intent, outcome, now);
        record.duration_ms = elapsed_ms;
        engine.note_history(record);
        if status == "success" {
            engine.note_executed();
        }
        Ok(Flow::Continue)
    }
}

/// Ensures a final result exists for the renderer.
struct Render;

impl Middleware for Render {
    fn name(&self) -> &'static str {
        "render"
    }

    fn handle(&self, ctx: &mut PipelineContext, _engine: &mut Engine) -> Result<Flow> {
        if ctx.result.is_none() {
            ctx.result = Some(CommandResult::success(serde_json::json!({}), None));
        }
        Ok(Flow::Continue)
    }
}

fn stages() -> Vec<Box<dyn Middleware>> {
    vec![
        Box::new(InputNormalizer),
        Box::new(IntentClassifier),
        Box::new(SecurityGuard),
        Box::new(Validation),
        Box::new(Execute),
        Box::new(Analytics),
        Box::new(Render),
    ]
}

/// Run one raw line through the chain. Errors are converted to error
/// results here; nothing aborts the process.
pub fn dispatch(engine: &mut Engine, raw: &str) -> CommandResult {
    let mut ctx = PipelineContext::new(raw);
    for stage in stages() {
        match stage.handle(&mut ctx, engine) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Halt) => break,
            Err(err) => {
                tracing::debug!(stage = stage.name(), error = %err, "command halted");
                let now = engine.clock_now();
                let mut record = CommandRecord::new(
                    ctx.raw.trim(),
                    ctx.intent(),
                    Outcome::failed(err.to_string()),
                    now,
                );
                record.duration_ms = ctx.started.elapsed().as_millis() as u64;
                engine.note_history(record);
                return output::error_result(&err);
            }
        }
    }
    ctx.result
        .unwrap_or_else(|| CommandResult::success(serde_json::json!({}), None))
}
