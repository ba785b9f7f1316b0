//! tasklog - Event-Sourced Task Manager Library
//!
//! This library provides the core engine for the tasklog CLI: an in-memory,
//! append-only event log, a derived projection, a multi-stage command
//! pipeline, and undo/macro/snapshot subsystems built on top of the log.
//! Nothing persists beyond the process.
//!
//! # Core Concepts
//!
//! - **Events**: immutable facts, strictly ordered by sequence number
//! - **Projection**: the current task view, always equal to a full replay
//! - **Pipeline**: normalize, classify, guard, validate, execute, record,
//!   render, one command at a time
//! - **Undo**: inverse events appended to the log, never history rewrites
//! - **Macros**: recorded command lines replayed through the same pipeline
//! - **Snapshots**: atomic whole-state capture and restore
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `tasklog.toml`
//! - `engine`: The explicit engine context threaded through the pipeline
//! - `error`: Error types and result aliases
//! - `event`: Event vocabulary
//! - `history`: Command history records
//! - `macros`: Macro recording and storage
//! - `output`: `CommandResult` rendering, themes, JSON envelope
//! - `parser`: Grammar-driven command parser with fuzzy suggestions
//! - `pipeline`: The fixed middleware chain
//! - `plugin`: Capability interface for plugin verbs and checks
//! - `projection`: Event-fold task view
//! - `snapshot`: Whole-state snapshots
//! - `state`: CLI interaction state machine
//! - `store`: Append-only event store
//! - `task`: Task domain model and validation
//! - `undo`: Inverse-event undo stack

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod history;
pub mod macros;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod plugin;
pub mod projection;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod task;
pub mod undo;

pub use error::{Error, Result};
