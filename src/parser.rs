//! Command parser: raw text to typed commands.
//!
//! Grammar (verbs are case-insensitive; `|` separates title from
//! description; trailing `#tag` tokens attach tags):
//!
//! ```text
//! add       := ("add" | "a") text ["|" text] {"#" tag}
//! list      := ("list" | "view" | "l") ["pending" | "completed" | "all"]
//! show      := "show" id
//! update    := ("update" | "edit") id [text] ["|" text] {"#" tag}
//! delete    := ("delete" | "remove" | "del" | "d") id
//! complete  := ("complete" | "done" | "finish" | "c") id
//! reopen    := "reopen" id
//! undo      := "undo" | "revert"
//! help      := "help" [verb]
//! theme     := "theme" [name]
//! snapshot  := "snapshot" ("save" [name] | "load" name | "list")
//! macro     := "macro" ("record" | "stop" name | "play" name | "list")
//! history   := "history" [limit]
//! stats     := "stats"
//! exit      := "exit" | "quit" | "q"
//! confirm   := "yes" | "y" | "no" | "n"
//! ```
//!
//! Unknown verbs produce a parse error carrying bounded edit-distance
//! suggestions instead of a hard failure. Parsing never panics.

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::task::TaskPatch;

/// Canonical verb set, used for suggestions and `help`.
pub const VERBS: &[&str] = &[
    "add", "list", "show", "update", "delete", "complete", "reopen", "undo", "help", "theme",
    "snapshot", "macro", "history", "stats", "exit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    Pending,
    Completed,
    All,
}

impl ListFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListFilter::Pending => "pending",
            ListFilter::Completed => "completed",
            ListFilter::All => "all",
        }
    }
}

/// A typed, fully classified command.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Add {
        title: String,
        description: Option<String>,
        tags: Vec<String>,
    },
    List {
        filter: ListFilter,
    },
    Show {
        id: u64,
    },
    Update {
        id: u64,
        patch: TaskPatch,
    },
    Delete {
        id: u64,
    },
    Complete {
        id: u64,
    },
    Reopen {
        id: u64,
    },
    Undo,
    Help {
        topic: Option<String>,
    },
    Theme {
        name: Option<String>,
    },
    SnapshotSave {
        name: Option<String>,
    },
    SnapshotLoad {
        name: String,
    },
    SnapshotList,
    MacroRecord,
    MacroStop {
        name: String,
    },
    MacroPlay {
        name: String,
    },
    MacroList,
    History {
        limit: Option<usize>,
    },
    Stats,
    Exit,
    Confirm {
        accepted: bool,
    },
}

impl ParsedCommand {
    /// Stable intent name for history, analytics, and rendering.
    pub fn intent(&self) -> &'static str {
        match self {
            ParsedCommand::Add { .. } => "add",
            ParsedCommand::List { .. } => "list",
            ParsedCommand::Show { .. } => "show",
            ParsedCommand::Update { .. } => "update",
            ParsedCommand::Delete { .. } => "delete",
            ParsedCommand::Complete { .. } => "complete",
            ParsedCommand::Reopen { .. } => "reopen",
            ParsedCommand::Undo => "undo",
            ParsedCommand::Help { .. } => "help",
            ParsedCommand::Theme { .. } => "theme",
            ParsedCommand::SnapshotSave { .. } => "snapshot_save",
            ParsedCommand::SnapshotLoad { .. } => "snapshot_load",
            ParsedCommand::SnapshotList => "snapshot_list",
            ParsedCommand::MacroRecord => "macro_record",
            ParsedCommand::MacroStop { .. } => "macro_stop",
            ParsedCommand::MacroPlay { .. } => "macro_play",
            ParsedCommand::MacroList => "macro_list",
            ParsedCommand::History { .. } => "history",
            ParsedCommand::Stats => "stats",
            ParsedCommand::Exit => "exit",
            ParsedCommand::Confirm { .. } => "confirm",
        }
    }

    /// Macro-control commands are never captured into a recording.
    pub fn is_macro_control(&self) -> bool {
        matches!(
            self,
            ParsedCommand::MacroRecord
                | ParsedCommand::MacroStop { .. }
                | ParsedCommand::MacroPlay { .. }
                | ParsedCommand::MacroList
        )
    }
}

const HELP: &[(&str, &str)] = &[
    ("add", "add <title> [| <description>] [#tag ...] - create a task (alias: a)"),
    ("list", "list [pending|completed|all] - list tasks (aliases: view, l)"),
    ("show", "show <id> - task details and event count"),
    ("update", "update <id> [title] [| description] [#tag ...] - change fields (alias: edit)"),
    ("delete", "delete <id> - remove a task (aliases: remove, del, d)"),
    ("complete", "complete <id> - mark done (aliases: done, finish, c)"),
    ("reopen", "reopen <id> - mark a completed task pending again"),
    ("undo", "undo - revert the most recent reversible command (alias: revert)"),
    ("help", "help [verb] - show usage"),
    ("theme", "theme [name] - show or set the output theme"),
    ("snapshot", "snapshot save [name] | load <name> | list - whole-state snapshots"),
    ("macro", "macro record | stop <name> | play <name> | list - record and replay commands"),
    ("history", "history [limit] - recent commands, newest first"),
    ("stats", "stats - session counters"),
    ("exit", "exit - leave, printing the session summary (aliases: quit, q)"),
];

/// Usage lines for every built-in verb.
pub fn help_lines() -> Vec<String> {
    HELP.iter().map(|(_, usage)| usage.to_string()).collect()
}

/// Usage line for one verb, accepting synonyms and shortcuts.
pub fn help_for(topic: &str) -> Option<String> {
    let canonical = canonical_verb(topic)?;
    HELP.iter()
        .find(|(verb, _)| *verb == canonical)
        .map(|(_, usage)| usage.to_string())
}

/// Map any verb spelling (synonym or shortcut) to its canonical form.
pub fn canonical_verb(token: &str) -> Option<&'static str> {
    let verb = match token {
        "add" | "a" => "add",
        "list" | "view" | "l" => "list",
        "show" => "show",
        "update" | "edit" => "update",
        "delete" | "remove" | "del" | "d" => "delete",
        "complete" | "done" | "finish" | "c" => "complete",
        "reopen" => "reopen",
        "undo" | "revert" => "undo",
        "help" => "help",
        "theme" => "theme",
        "snapshot" => "snapshot",
        "macro" => "macro",
        "history" => "history",
        "stats" => "stats",
        "exit" | "quit" | "q" => "exit",
        "yes" | "y" => "yes",
        "no" | "n" => "no",
        _ => return None,
    };
    Some(verb)
}

/// Parse one raw line into a typed command.
pub fn parse(line: &str, config: &ParserConfig) -> Result<ParsedCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("empty command".to_string()));
    }

    let (verb_raw, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };
    let verb_lower = verb_raw.to_lowercase();

    let verb = canonical_verb(&verb_lower).ok_or_else(|| Error::Parse {
        input: verb_raw.to_string(),
        suggestions: suggestions_for(&verb_lower, config),
    })?;

    match verb {
        "add" => {
            let (title, description, tags) = split_title_spec(rest);
            let title = title.ok_or_else(|| Error::Validation("add requires a title".to_string()))?;
            Ok(ParsedCommand::Add {
                title,
                description: description.flatten(),
                tags: tags.unwrap_or_default(),
            })
        }
        "list" => {
            let filter = match rest.to_lowercase().as_str() {
                "" | "all" => ListFilter::All,
                "pending" => ListFilter::Pending,
                "completed" => ListFilter::Completed,
                other => {
                    return Err(Error::Validation(format!(
                        "unknown list filter '{other}' (expected pending, completed, or all)"
                    )))
                }
            };
            Ok(ParsedCommand::List { filter })
        }
        "show" => Ok(ParsedCommand::Show {
            id: parse_id("show", rest)?,
        }),
        "update" => {
            let (id_token, spec) = match rest.split_once(char::is_whitespace) {
                Some((id, spec)) => (id, spec.trim()),
                None => (rest, ""),
            };
            let id = parse_id("update", id_token)?;
            let (title, description, tags) = split_title_spec(spec);
            Ok(ParsedCommand::Update {
                id,
                patch: TaskPatch {
                    title,
                    description,
                    tags,
                },
            })
        }
        "delete" => Ok(ParsedCommand::Delete {
            id: parse_id("delete", rest)?,
        }),
        "complete" => Ok(ParsedCommand::Complete {
            id: parse_id("complete", rest)?,
        }),
        "reopen" => Ok(ParsedCommand::Reopen {
            id: parse_id("reopen", rest)?,
        }),
        "undo" => {
            expect_no_args("undo", rest)?;
            Ok(ParsedCommand::Undo)
        }
        "help" => Ok(ParsedCommand::Help {
            topic: optional_token(rest),
        }),
        "theme" => Ok(ParsedCommand::Theme {
            name: optional_token(rest),
        }),
        "snapshot" => parse_snapshot(rest, config),
        "macro" => parse_macro(rest, config),
        "history" => {
            let limit = match optional_token(rest) {
                None => None,
                Some(token) => Some(token.parse::<usize>().map_err(|_| {
                    Error::Validation(format!("history limit must be a number: {token}"))
                })?),
            };
            Ok(ParsedCommand::History { limit })
        }
        "stats" => {
            expect_no_args("stats", rest)?;
            Ok(ParsedCommand::Stats)
        }
        "exit" => {
            expect_no_args("exit", rest)?;
            Ok(ParsedCommand::Exit)
        }
        "yes" => Ok(ParsedCommand::Confirm { accepted: true }),
        "no" => Ok(ParsedCommand::Confirm { accepted: false }),
        _ => unreachable!("canonical_verb returned unknown verb {verb}"),
    }
}

fn parse_snapshot(rest: &str, config: &ParserConfig) -> Result<ParsedCommand> {
    let (sub, arg) = match rest.split_once(char::is_whitespace) {
        Some((sub, arg)) => (sub, arg.trim()),
        None => (rest, ""),
    };
    if sub.is_empty() {
        return Err(Error::Validation(
            "snapshot requires a subcommand (save, load, list)".to_string(),
        ));
    }
    match sub.to_lowercase().as_str() {
        "save" => Ok(ParsedCommand::SnapshotSave {
            name: optional_token(arg),
        }),
        "load" => Ok(ParsedCommand::SnapshotLoad {
            name: required_name("snapshot load", arg)?,
        }),
        "list" => {
            expect_no_args("snapshot list", arg)?;
            Ok(ParsedCommand::SnapshotList)
        }
        other => Err(Error::Parse {
            input: format!("snapshot {other}"),
            suggestions: closest(other, &["save", "load", "list"], config)
                .into_iter()
                .map(|s| format!("snapshot {s}"))
                .collect(),
        }),
    }
}

fn parse_macro(rest: &str, config: &ParserConfig) -> Result<ParsedCommand> {
    let (sub, arg) = match rest.split_once(char::is_whitespace) {
        Some((sub, arg)) => (sub, arg.trim()),
        None => (rest, ""),
    };
    if sub.is_empty() {
        return Err(Error::Validation(
            "macro requires a subcommand (record, stop, play, list)".to_string(),
        ));
    }
    match sub.to_lowercase().as_str() {
        "record" => {
            expect_no_args("macro record", arg)?;
            Ok(ParsedCommand::MacroRecord)
        }
        "stop" => Ok(ParsedCommand::MacroStop {
            name: required_name("macro stop", arg)?,
        }),
        "play" => Ok(ParsedCommand::MacroPlay {
            name: required_name("macro play", arg)?,
        }),
        "list" => {
            expect_no_args("macro list", arg)?;
            Ok(ParsedCommand::MacroList)
        }
        other => Err(Error::Parse {
            input: format!("macro {other}"),
            suggestions: closest(other, &["record", "stop", "play", "list"], config)
                .into_iter()
                .map(|s| format!("macro {s}"))
                .collect(),
        }),
    }
}

/// Split `text ["|" text] {"#" tag}` into (title, description marker, tags).
///
/// The description marker distinguishes "no `|` given" (`None`) from
/// "`|` given with empty text" (`Some(None)`, a clear).
fn split_title_spec(spec: &str) -> (Option<String>, Option<Option<String>>, Option<Vec<String>>) {
    let mut body = spec.trim();
    let mut tags_rev: Vec<String> = Vec::new();

    // pop trailing #tag tokens
    loop {
        let Some(idx) = body.rfind(char::is_whitespace) else {
            if let Some(tag) = body.strip_prefix('#') {
                tags_rev.push(tag.to_string());
                body = "";
            }
            break;
        };
        let last = &body[idx + 1..];
        if let Some(tag) = last.strip_prefix('#') {
            tags_rev.push(tag.to_string());
            body = body[..idx].trim_end();
        } else {
            break;
        }
    }

    let tags = if tags_rev.is_empty() {
        None
    } else {
        tags_rev.reverse();
        Some(tags_rev)
    };

    let (title_part, description) = match body.split_once('|') {
        Some((left, right)) => {
            let right = right.trim();
            let description = if right.is_empty() {
                Some(None)
            } else {
                Some(Some(right.to_string()))
            };
            (left.trim(), description)
        }
        None => (body, None),
    };

    let title = if title_part.is_empty() {
        None
    } else {
        Some(title_part.to_string())
    };

    (title, description, tags)
}

fn parse_id(verb: &str, token: &str) -> Result<u64> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Validation(format!("{verb} requires a task id")));
    }
    token
        .parse::<u64>()
        .map_err(|_| Error::Validation(format!("task id must be a number: {token}")))
}

fn required_name(context: &str, arg: &str) -> Result<String> {
    optional_token(arg).ok_or_else(|| Error::Validation(format!("{context} requires a name")))
}

fn optional_token(arg: &str) -> Option<String> {
    let trimmed = arg.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn expect_no_args(verb: &str, rest: &str) -> Result<()> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!("{verb} takes no arguments")))
    }
}

/// Suggestions for an unknown verb, bounded by edit distance.
fn suggestions_for(verb: &str, config: &ParserConfig) -> Vec<String> {
    closest(verb, VERBS, config)
}

fn closest(input: &str, candidates: &[&str], config: &ParserConfig) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .filter_map(|candidate| {
            levenshtein_within(input, candidate, config.max_suggestion_distance)
                .map(|distance| (distance, *candidate))
        })
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(config.max_suggestions)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Edit distance between `a` and `b`, or `None` when it exceeds `max`.
fn levenshtein_within(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        let mut row_min = current[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
            row_min = row_min.min(current[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut current);
    }

    let distance = prev[b.len()];
    if distance <= max {
        Some(distance)
    } else {
        None
    }
}
