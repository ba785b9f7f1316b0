//! Macro recording and storage.
//!
//! A macro is a named, ordered list of normalized command lines captured
//! during a recording session. At most one recording is active at a time.
//! Playback itself lives in the engine, which re-submits each line through
//! the same pipeline used for live input.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct MacroDef {
    pub name: String,
    pub commands: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct MacroEngine {
    recording: Option<Vec<String>>,
    saved: BTreeMap<String, MacroDef>,
}

impl MacroEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Open a recording buffer. Rejected while another recording is active;
    /// the existing buffer is left untouched.
    pub fn start_recording(&mut self) -> Result<()> {
        if self.recording.is_some() {
            return Err(Error::MacroRecordingActive);
        }
        self.recording = Some(Vec::new());
        Ok(())
    }

    /// Capture one successful command line into the active buffer, if any.
    pub fn capture(&mut self, line: &str) {
        if let Some(buffer) = &mut self.recording {
            buffer.push(line.to_string());
        }
    }

    /// Number of lines captured so far, if recording.
    pub fn recording_len(&self) -> Option<usize> {
        self.recording.as_ref().map(|buffer| buffer.len())
    }

    /// Close the buffer and store it under `name`. Callers are responsible
    /// for confirming overwrites before passing `overwrite = true`.
    pub fn stop_recording(
        &mut self,
        name: &str,
        overwrite: bool,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        if self.recording.is_none() {
            return Err(Error::NoMacroRecording);
        }
        if self.saved.contains_key(name) && !overwrite {
            return Err(Error::Validation(format!(
                "macro '{name}' already exists (confirm to overwrite)"
            )));
        }
        let commands = self.recording.take().unwrap_or_default();
        let count = commands.len();
        self.saved.insert(
            name.to_string(),
            MacroDef {
                name: name.to_string(),
                commands,
                created_at: now,
            },
        );
        Ok(count)
    }

    /// Drop any active recording without saving. Used on snapshot restore.
    pub fn abort_recording(&mut self) {
        self.recording = None;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.saved.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&MacroDef> {
        self.saved
            .get(name)
            .ok_or_else(|| Error::MacroNotFound(name.to_string()))
    }

    /// Stored macro names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.saved.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_recording_is_rejected_without_clobbering() {
        let mut macros = MacroEngine::new();
        macros.start_recording().expect("start");
        macros.capture("add A");

        let err = macros.start_recording().expect_err("nested");
        assert!(matches!(err, Error::MacroRecordingActive));
        assert_eq!(macros.recording_len(), Some(1));
    }

    #[test]
    fn stop_without_recording_is_rejected() {
        let mut macros = MacroEngine::new();
        let err = macros
            .stop_recording("x", false, Utc::now())
            .expect_err("no recording");
        assert!(matches!(err, Error::NoMacroRecording));
    }

    #[test]
    fn record_stop_play_round_trip() {
        let mut macros = MacroEngine::new();
        macros.start_recording().expect("start");
        macros.capture("add A");
        macros.capture("add B");
        let count = macros.stop_recording("pair", false, Utc::now()).expect("stop");
        assert_eq!(count, 2);

        let def = macros.get("pair").expect("macro");
        assert_eq!(def.commands, vec!["add A".to_string(), "add B".to_string()]);
        assert!(!macros.is_recording());
    }

    #[test]
    fn existing_name_requires_overwrite() {
        let mut macros = MacroEngine::new();
        macros.start_recording().expect("start");
        macros.stop_recording("x", false, Utc::now()).expect("stop");

        macros.start_recording().expect("start again");
        macros.capture("list");
        let err = macros
            .stop_recording("x", false, Utc::now())
            .expect_err("needs confirm");
        assert!(matches!(err, Error::Validation(_)));
        // buffer survives the rejection
        assert_eq!(macros.recording_len(), Some(1));

        macros.stop_recording("x", true, Utc::now()).expect("overwrite");
        assert_eq!(macros.get("x").expect("macro").commands, vec!["list".to_string()]);
    }

    #[test]
    fn names_are_sorted() {
        let mut macros = MacroEngine::new();
        for name in ["zeta", "alpha", "mid"] {
            macros.start_recording().expect("start");
            macros.stop_recording(name, false, Utc::now()).expect("stop");
        }
        assert_eq!(macros.names(), vec!["alpha", "mid", "zeta"]);
    }
}
