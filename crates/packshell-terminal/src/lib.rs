//! Interactive command shell for the server pack generator.
//!
//! The shell is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name at startup. The session loop
//! reads lines from a `LineSource`, the dispatcher parses each line, resolves
//! the command name and runs `execute()`, and any failure is reported without
//! ending the session.

pub mod app_commands;
mod commands;
pub mod dispatch;
pub mod editor;
mod interpreter;
pub mod parser;
pub mod services;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;

/// Register the pack generator commands (config-gen, home-dir, ...) into a registry.
pub use app_commands::register_app_commands;
/// Register the shell builtins (help, clear, history, keymap, exit) into a registry.
pub use commands::register_builtins;
/// Terminal-backed line editor and its settings.
pub use editor::{EditorSettings, LineEditor, LineSource, ReadOutcome};
/// Argument schema used for completion and hints.
pub use interpreter::{ArgKind, ArgSpec, ValueHint};
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text, table, signals).
pub use interpreter::CommandOutput;
/// Registry of available commands and aliases.
pub use interpreter::CommandRegistry;
/// Per-dispatch view passed to every command.
pub use interpreter::Environment;
/// Collaborator interfaces implemented by the binary.
pub use services::{ConfigEditor, PackagingApi, Services, SetupReport, UpdateChecker};
/// The read-eval loop.
pub use session::{Session, SessionState};
