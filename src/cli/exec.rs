//! Non-interactive execution of command lines.
//!
//! Since the engine holds no persistent state, `exec` is the way to drive a
//! multi-command session from the shell: every line runs against the same
//! engine, in order, then the session summary is printed.

use std::io::Write;

use crate::engine::Engine;
use crate::error::Result;
use crate::output::{self, CommandResult, OutputOptions};

pub fn run(mut engine: Engine, options: OutputOptions, lines: &[String]) -> Result<()> {
    let mut stdout = std::io::stdout();

    for line in lines {
        let result = engine.handle_line(line);
        let exited = engine.exit_requested();
        if let Some(text) = output::render(&result, engine.theme(), options)? {
            writeln!(stdout, "{text}")?;
        }
        if exited {
            return Ok(());
        }
    }

    let summary = CommandResult::success(engine.session_summary(), None);
    if let Some(text) = output::render(&summary, engine.theme(), options)? {
        writeln!(stdout, "{text}")?;
    }
    Ok(())
}
