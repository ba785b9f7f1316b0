//! Interactive input loop.
//!
//! One line in, one fully resolved command out. EOF and the `exit` command
//! both leave through the session-summary flow.

use std::io::{BufRead, Write};

use crate::engine::Engine;
use crate::error::Result;
use crate::output::{self, CommandResult, OutputOptions};

pub fn run(mut engine: Engine, options: OutputOptions) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let show_prompt = !options.json && !options.quiet;
    let mut input = String::new();

    loop {
        if show_prompt {
            write!(stdout, "tasklog> ")?;
            stdout.flush()?;
        }
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        let result = engine.handle_line(line);
        let exited = engine.exit_requested();
        if let Some(text) = output::render(&result, engine.theme(), options)? {
            writeln!(stdout, "{text}")?;
        }
        if exited {
            // the exit command already carried the session summary
            return Ok(());
        }
    }

    // EOF: still run the exit-summary flow
    let summary = CommandResult::success(engine.session_summary(), None);
    if let Some(text) = output::render(&summary, engine.theme(), options)? {
        writeln!(stdout, "{text}")?;
    }
    Ok(())
}
