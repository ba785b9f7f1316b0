//! tasklog - Event-Sourced Task Manager CLI
//!
//! A single-user task manager driven by an append-only in-memory event log,
//! with a middleware command pipeline, undo, macros, and snapshots.

use clap::Parser;
use tasklog::cli::Cli;
use tasklog::output;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG.
    // Keep startup robust in CI/robot envs: ignore invalid/huge filters.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    let json = cli.json || cli.test_mode;
    if let Err(err) = cli.run() {
        let result = output::error_result(&err);
        let rendered = output::render(
            &result,
            output::Theme::Plain,
            output::OutputOptions { json, quiet: false },
        );
        match rendered {
            Ok(Some(text)) => eprintln!("{text}"),
            Ok(None) => {}
            Err(render_err) => eprintln!("error: {render_err}"),
        }
        std::process::exit(err.exit_code());
    }
}
