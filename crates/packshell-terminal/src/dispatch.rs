//! Line dispatch: parse, resolve, invoke, render.
//!
//! Nothing that happens while handling one line escapes this module. Parse
//! failures, unknown commands, handler errors and handler panics are written
//! to the session output as a single `error: ...` line.

use std::any::Any;
use std::cell::Cell;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use packshell_types::error::{Result, ShellError};

use crate::interpreter::{CommandOutput, Environment};
use crate::parser::{self, Parsed, ParsedInvocation};

/// ANSI sequence: clear screen, cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// What happened to a dispatched line.
#[derive(Debug)]
pub enum Dispatch {
    /// Blank line, nothing ran.
    Empty,
    /// A command ran and its output was rendered.
    Done,
    /// A command asked to end the session.
    Exit,
    /// The line failed. The error has already been reported.
    Failed(ShellError),
}

/// Parse and execute one input line, writing results to `out`.
pub fn dispatch(line: &str, env: &mut Environment<'_>, out: &mut dyn Write) -> Dispatch {
    let invocation = match parser::parse(line) {
        Ok(Parsed::Empty) => return Dispatch::Empty,
        Ok(Parsed::Invocation(inv)) => inv,
        Err(e) => return fail(e, out),
    };

    match invoke(&invocation, env) {
        Ok(CommandOutput::Exit) => Dispatch::Exit,
        Ok(output) => {
            if let Err(e) = render(&output, out) {
                log::warn!("Failed to write output of '{}': {e}", invocation.name);
            }
            Dispatch::Done
        },
        Err(e) => fail(e, out),
    }
}

/// Resolve and run a parsed invocation.
///
/// Handler failures, including panics, come back wrapped in
/// [`ShellError::Handler`].
pub fn invoke(invocation: &ParsedInvocation, env: &mut Environment<'_>) -> Result<CommandOutput> {
    let registry = env.registry;
    let cmd = registry
        .resolve(&invocation.name)
        .ok_or_else(|| ShellError::UnknownCommand(invocation.name.clone()))?;
    let args = invocation.arg_refs();
    log::debug!("Dispatching '{}' with {} arg(s)", cmd.name(), args.len());

    let name = cmd.name().to_string();
    match quietly(|| cmd.execute(&args, env)) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ShellError::handler(&name, e)),
        Err(payload) => Err(ShellError::handler(
            &name,
            ShellError::Command(format!("panicked: {}", panic_message(payload.as_ref()))),
        )),
    }
}

/// Write a command's output to the session stream.
pub fn render(output: &CommandOutput, out: &mut dyn Write) -> io::Result<()> {
    match output {
        CommandOutput::Text(text) => {
            if !text.is_empty() {
                writeln!(out, "{}", text.trim_end_matches('\n'))?;
            }
        },
        CommandOutput::Table { headers, rows } => write_table(headers, rows, out)?,
        CommandOutput::Clear => write!(out, "{CLEAR_SCREEN}")?,
        CommandOutput::None | CommandOutput::Exit => {},
    }
    out.flush()
}

/// Report a per-line failure. The session keeps running.
pub fn report(err: &ShellError, out: &mut dyn Write) {
    log::warn!("{err:?}");
    if let Err(e) = writeln!(out, "error: {err}").and_then(|_| out.flush()) {
        log::warn!("Failed to report error: {e}");
    }
}

fn fail(err: ShellError, out: &mut dyn Write) -> Dispatch {
    report(&err, out);
    Dispatch::Failed(err)
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, catching a panic without the default hook printing it.
///
/// The caught panic is reported through [`report`] instead. Panics outside
/// `quietly` still reach the previously installed hook.
fn quietly<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });

    let outer = QUIET_PANICS.with(|q| q.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    QUIET_PANICS.with(|q| q.set(outer));
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn write_table(headers: &[String], rows: &[Vec<String>], out: &mut dyn Write) -> io::Result<()> {
    let columns = headers
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let write_row = |row: &[String], out: &mut dyn Write| -> io::Result<()> {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            line.push_str(&format!("{cell:<width$}", width = widths[i]));
        }
        writeln!(out, "{}", line.trim_end())
    };

    write_row(headers, out)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(&rule[..headers.len().min(rule.len())], out)?;
    for row in rows {
        write_row(row, out)?;
    }
    Ok(())
}
