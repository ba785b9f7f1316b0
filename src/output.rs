//! Result rendering for tasklog commands.
//!
//! The engine never formats text directly; it produces a `CommandResult`
//! and the renderer turns that into themed human output or the versioned
//! JSON envelope. Envelope serialization uses `serde_json`'s sorted object
//! keys, so machine output is byte-stable for identical input.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "tasklog.v1";

/// What a command hands to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub status: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success(data: Value, message: Option<String>) -> Self {
        Self {
            status: "success".to_string(),
            data,
            message,
        }
    }

    /// A pending confirmation prompt.
    pub fn confirm(data: Value, message: String) -> Self {
        Self {
            status: "confirm".to_string(),
            data,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

/// Convert an error into an error-status result at the pipeline boundary.
pub fn error_result(err: &Error) -> CommandResult {
    let mut data = serde_json::json!({
        "kind": err.kind(),
        "code": err.exit_code(),
    });
    if let Some(details) = err.details() {
        data["details"] = details;
    }
    CommandResult {
        status: "error".to_string(),
        data,
        message: Some(err.to_string()),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

pub const THEMES: &[&str] = &["plain", "unicode"];

/// Theme selector for human rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Plain,
    Unicode,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Plain => "plain",
            Theme::Unicode => "unicode",
        }
    }

    fn bullet(&self) -> &'static str {
        match self {
            Theme::Plain => "-",
            Theme::Unicode => "•",
        }
    }

    fn status_mark(&self, completed: bool) -> &'static str {
        match (self, completed) {
            (Theme::Plain, false) => "[ ]",
            (Theme::Plain, true) => "[x]",
            (Theme::Unicode, false) => "○",
            (Theme::Unicode, true) => "✔",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Theme::Plain),
            "unicode" => Ok(Theme::Unicode),
            other => Err(Error::Validation(format!(
                "unknown theme '{other}' (expected one of: {})",
                THEMES.join(", ")
            ))),
        }
    }
}

/// Render a result for output. Returns `None` when nothing should be
/// printed (quiet mode suppresses successful output, never errors).
pub fn render(result: &CommandResult, theme: Theme, options: OutputOptions) -> Result<Option<String>> {
    if options.json {
        let envelope = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "status": result.status,
            "data": result.data,
            "message": result.message,
        });
        return Ok(Some(serde_json::to_string_pretty(&envelope)?));
    }

    if options.quiet && result.is_success() {
        return Ok(None);
    }

    Ok(Some(render_human(result, theme)))
}

fn render_human(result: &CommandResult, theme: Theme) -> String {
    let mut lines: Vec<String> = Vec::new();

    if result.is_error() {
        if let Some(message) = &result.message {
            lines.push(format!("error: {message}"));
        }
        if let Some(suggestions) = result.data["details"]["suggestions"].as_array() {
            let names: Vec<&str> = suggestions.iter().filter_map(Value::as_str).collect();
            if !names.is_empty() {
                lines.push(format!("hint: did you mean {}?", names.join(", ")));
            }
        }
        return lines.join("\n");
    }

    if let Some(message) = &result.message {
        lines.push(message.clone());
    }

    if let Some(tasks) = result.data["tasks"].as_array() {
        for task in tasks {
            lines.push(format_task_line(task, theme));
        }
        if tasks.is_empty() {
            lines.push("no tasks".to_string());
        }
    }

    if result.data["task"].is_object() {
        push_task_details(&mut lines, &result.data, theme);
    }

    for key in ["snapshots", "macros", "commands"] {
        if let Some(names) = result.data[key].as_array() {
            if names.is_empty() {
                lines.push(format!("no {key}"));
            }
            for name in names.iter().filter_map(Value::as_str) {
                lines.push(format!("{} {name}", theme.bullet()));
            }
        }
    }

    if let Some(entries) = result.data["entries"].as_array() {
        if entries.is_empty() {
            lines.push("no commands yet".to_string());
        }
        for entry in entries {
            let input = entry["input"].as_str().unwrap_or("?");
            let status = entry["outcome"]["status"].as_str().unwrap_or("?");
            lines.push(format!("{} {input} [{status}]", theme.bullet()));
        }
    }

    if result.data["summary"].is_object() {
        push_summary(&mut lines, &result.data["summary"], theme);
    }

    lines.join("\n")
}

fn format_task_line(task: &Value, theme: Theme) -> String {
    let completed = task["status"].as_str() == Some("completed");
    let id = task["id"].as_u64().unwrap_or(0);
    let title = task["title"].as_str().unwrap_or("");
    let mut line = format!("{} {id}. {title}", theme.status_mark(completed));
    if let Some(tags) = task["tags"].as_array() {
        for tag in tags.iter().filter_map(Value::as_str) {
            line.push_str(&format!(" #{tag}"));
        }
    }
    line
}

fn push_task_details(lines: &mut Vec<String>, data: &Value, theme: Theme) {
    let task = &data["task"];
    lines.push(format_task_line(task, theme));
    if let Some(description) = task["description"].as_str() {
        lines.push(format!("  description: {description}"));
    }
    if let Some(created) = task["created_at"].as_str() {
        lines.push(format!("  created: {created}"));
    }
    if let Some(updated) = task["updated_at"].as_str() {
        lines.push(format!("  updated: {updated}"));
    }
    if let Some(events) = data["events"].as_u64() {
        lines.push(format!("  events: {events}"));
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &Value, theme: Theme) {
    lines.push("Session summary:".to_string());
    for (label, key) in [
        ("tasks created", "tasks_created"),
        ("tasks completed", "tasks_completed"),
        ("commands executed", "commands_executed"),
    ] {
        if let Some(count) = summary[key].as_u64() {
            lines.push(format!("{} {label}: {count}", theme.bullet()));
        }
    }
}
