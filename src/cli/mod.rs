//! Command-line interface for tasklog
//!
//! This module defines the CLI structure using clap derive macros.
//! Each run mode is defined in its own submodule.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::engine::{Engine, EngineOptions};
use crate::error::Result;
use crate::output::OutputOptions;

mod exec;
mod repl;

/// tasklog - Event-Sourced Task Manager
///
/// A single-user task manager driven by an append-only in-memory event log,
/// with undo, macro recording, and whole-state snapshots. Nothing persists
/// beyond the process.
#[derive(Parser, Debug)]
#[command(name = "tasklog")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./tasklog.toml)
    #[arg(long, global = true, env = "TASKLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output theme: plain or unicode
    #[arg(long, global = true, env = "TASKLOG_THEME")]
    pub theme: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Deterministic machine-readable output (implies --json)
    #[arg(long, global = true)]
    pub test_mode: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available run modes
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive input loop (the default when no mode is given)
    Repl,

    /// Run command lines in order against one engine, then exit
    Exec {
        /// Raw command lines, e.g. "add Buy milk"
        #[arg(required = true)]
        lines: Vec<String>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        if let Some(theme) = &self.theme {
            config.output.theme = theme.clone();
        }

        let options = OutputOptions {
            json: self.json || self.test_mode,
            quiet: self.quiet,
        };
        let command = self.command.unwrap_or(Commands::Repl);
        let interactive = matches!(command, Commands::Repl) && !self.test_mode;
        let engine = Engine::new(
            config,
            EngineOptions {
                interactive,
                test_mode: self.test_mode,
            },
        )?;

        match command {
            Commands::Repl => repl::run(engine, options),
            Commands::Exec { lines } => exec::run(engine, options, &lines),
        }
    }
}
