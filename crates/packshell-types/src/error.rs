//! Error types for packshell.

use std::io;

/// Errors produced by the shell and its commands.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("duplicate command name: {0}")]
    DuplicateName(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// A handler failed while executing. Wraps the handler's own error.
    #[error("{command}: {source}")]
    Handler {
        command: String,
        #[source]
        source: Box<ShellError>,
    },

    #[error("{0}")]
    Command(String),

    #[error("usage: {0}")]
    Usage(String),

    #[error("terminal unavailable: {0}")]
    Resource(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl ShellError {
    /// Wrap a handler failure with the name of the command that raised it.
    pub fn handler(command: &str, source: ShellError) -> Self {
        Self::Handler {
            command: command.to_string(),
            source: Box::new(source),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
