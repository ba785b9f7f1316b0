//! Error types for tasklog
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad input, unknown task, unknown snapshot)
//! - 3: Blocked by policy (security guard, illegal state transition)
//! - 4: Operation failed (macro playback, IO)

use thiserror::Error;

/// Exit codes for the tasklog CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tasklog operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Unrecognized command: {input}")]
    Parse {
        input: String,
        suggestions: Vec<String>,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(u64),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Macro not found: {0}")]
    MacroNotFound(String),

    #[error("Nothing to undo")]
    UndoUnavailable,

    #[error("A macro recording is already active")]
    MacroRecordingActive,

    #[error("No macro recording is active")]
    NoMacroRecording,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Policy blocks (exit code 3)
    #[error("Rejected unsafe input: {0}")]
    Security(String),

    #[error("Illegal transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    // Operation failures (exit code 4)
    #[error("Macro step {step} failed ({command}): {cause}")]
    MacroPlayback {
        step: usize,
        command: String,
        cause: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::Parse { .. }
            | Error::Validation(_)
            | Error::NotFound(_)
            | Error::SnapshotNotFound(_)
            | Error::MacroNotFound(_)
            | Error::UndoUnavailable
            | Error::MacroRecordingActive
            | Error::NoMacroRecording
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::Security(_) | Error::InvalidTransition { .. } => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::MacroPlayback { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable machine-readable kind for the output envelope
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "parse_error",
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::SnapshotNotFound(_) => "snapshot_not_found",
            Error::MacroNotFound(_) => "macro_not_found",
            Error::UndoUnavailable => "undo_unavailable",
            Error::MacroRecordingActive => "macro_recording_active",
            Error::NoMacroRecording => "no_macro_recording",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Security(_) => "security_violation",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::MacroPlayback { .. } => "macro_playback_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::TomlParse(_) => "toml_parse_error",
        }
    }

    /// Structured details for the error envelope, if the kind carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Parse { suggestions, .. } if !suggestions.is_empty() => {
                Some(serde_json::json!({ "suggestions": suggestions }))
            }
            Error::MacroPlayback { step, command, .. } => {
                Some(serde_json::json!({ "step": step, "command": command }))
            }
            Error::InvalidTransition { from, to } => {
                Some(serde_json::json!({ "from": from, "to": to }))
            }
            _ => None,
        }
    }
}

/// Result type alias for tasklog operations
pub type Result<T> = std::result::Result<T, Error>;
