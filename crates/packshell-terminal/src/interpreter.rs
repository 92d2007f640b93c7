//! Command trait, argument schema, and the command registry.
//!
//! The registry is built once at startup and is read-only while the session
//! runs. Names and aliases share a single namespace and are matched exactly
//! (case-sensitive).

use std::collections::HashMap;

use packshell_types::error::{Result, ShellError};

use crate::editor::KeyBinding;
use crate::services::Services;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Tabular data (header row + data rows).
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Command produced no visible output.
    None,
    /// Signal to clear the terminal screen.
    Clear,
    /// Signal to end the session, same as end of input.
    Exit,
}

/// How an argument is written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A switch such as `--force`.
    Flag,
    /// A bare value in position.
    Positional,
}

/// What values a positional argument accepts, used for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueHint {
    None,
    /// The name of a registered command.
    CommandName,
    /// A filesystem path.
    Path,
    /// One of a fixed set of values.
    OneOf(&'static [&'static str]),
}

/// One entry of a command's argument schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    /// Flag spelling (`--force`) or positional placeholder (`path`).
    pub name: &'static str,
    pub kind: ArgKind,
    pub description: &'static str,
    pub hint: ValueHint,
}

impl ArgSpec {
    pub const fn flag(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Flag,
            description,
            hint: ValueHint::None,
        }
    }

    pub const fn positional(
        name: &'static str,
        description: &'static str,
        hint: ValueHint,
    ) -> Self {
        Self {
            name,
            kind: ArgKind::Positional,
            description,
            hint,
        }
    }

    /// Spelling used in usage listings: `--force` or `<path>`.
    pub fn display(&self) -> String {
        match self.kind {
            ArgKind::Flag => self.name.to_string(),
            ArgKind::Positional => format!("<{}>", self.name),
        }
    }
}

/// Per-dispatch view handed to a command.
pub struct Environment<'a> {
    /// The registry the command was resolved from.
    pub registry: &'a CommandRegistry,
    /// Pack generator collaborators.
    pub services: &'a mut Services,
    /// Lines entered so far this session, oldest first.
    pub history: &'a [String],
    /// Key bindings active in the line editor.
    pub key_bindings: &'a [KeyBinding],
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "home-dir \[path\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Alternate names registered together with the command.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Flags and positional parameters, for completion and hints.
    fn args(&self) -> &[ArgSpec] {
        &[]
    }

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

/// Registry of available commands.
///
/// Commands keep their registration order; `index` maps every name and alias
/// to a position in `commands`.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    index: HashMap<String, usize>,
    aliases: Vec<(String, usize)>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
            aliases: Vec::new(),
        }
    }

    /// Register a command under its name and declared aliases.
    ///
    /// Fails with [`ShellError::DuplicateName`] if any of those names is
    /// already taken; nothing is inserted in that case.
    pub fn register(&mut self, cmd: Box<dyn Command>) -> Result<()> {
        let mut names: Vec<String> = Vec::with_capacity(1 + cmd.aliases().len());
        names.push(cmd.name().to_string());
        names.extend(cmd.aliases().iter().map(|a| a.to_string()));

        for (i, name) in names.iter().enumerate() {
            check_name(name)?;
            if self.index.contains_key(name) || names[..i].contains(name) {
                return Err(ShellError::DuplicateName(name.clone()));
            }
        }

        let slot = self.commands.len();
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                self.aliases.push((name.clone(), slot));
            }
            self.index.insert(name, slot);
        }
        log::debug!("Registered command '{}'", cmd.name());
        self.commands.push(cmd);
        Ok(())
    }

    /// Bind `alias` to the command currently registered as `existing`.
    pub fn alias(&mut self, existing: &str, alias: &str) -> Result<()> {
        let slot = *self
            .index
            .get(existing)
            .ok_or_else(|| ShellError::UnknownCommand(existing.to_string()))?;
        check_name(alias)?;
        if self.index.contains_key(alias) {
            return Err(ShellError::DuplicateName(alias.to_string()));
        }
        self.index.insert(alias.to_string(), slot);
        self.aliases.push((alias.to_string(), slot));
        Ok(())
    }

    /// Look up a command by exact name or alias.
    pub fn resolve(&self, name: &str) -> Option<&dyn Command> {
        self.index.get(name).map(|&slot| self.commands[slot].as_ref())
    }

    /// Usage and description text for a command, as shown by `help <name>`
    /// and the tail-tip hint. The first line is the one-line summary.
    pub fn describe(&self, name: &str) -> Option<String> {
        let cmd = self.resolve(name)?;
        let mut out = format!("{} - {}", cmd.usage(), cmd.description());
        let aliases = self.aliases_of(cmd.name());
        if !aliases.is_empty() {
            out.push_str(&format!("\n  aliases: {}", aliases.join(", ")));
        }
        for arg in cmd.args() {
            out.push_str(&format!("\n  {:<14} {}", arg.display(), arg.description));
        }
        Some(out)
    }

    /// Aliases bound to the command named `name`, in binding order.
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let Some(&slot) = self.index.get(name) else {
            return Vec::new();
        };
        self.aliases
            .iter()
            .filter(|(_, s)| *s == slot)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    /// Registered commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    /// Return a sorted list of (name, description) pairs.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .iter()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Every name and alias, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(|n| n.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Return sorted completions (names and aliases) for a partial command name.
    pub fn completions(&self, partial: &str) -> Vec<String> {
        self.names()
            .into_iter()
            .filter(|name| name.starts_with(partial))
            .map(str::to_string)
            .collect()
    }

    /// Number of registered commands, not counting aliases.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(ShellError::Command(format!("invalid command name: {name:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORCE: &[ArgSpec] = &[ArgSpec::flag("--force", "Do it anyway")];

    struct Named {
        name: &'static str,
        aliases: &'static [&'static str],
    }

    impl Command for Named {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "test command"
        }
        fn usage(&self) -> &str {
            self.name
        }
        fn aliases(&self) -> &[&str] {
            self.aliases
        }
        fn args(&self) -> &[ArgSpec] {
            FORCE
        }
        fn execute(&self, _: &[&str], _: &mut Environment<'_>) -> Result<CommandOutput> {
            Ok(CommandOutput::Text(self.name.to_string()))
        }
    }

    fn cmd(name: &'static str) -> Box<dyn Command> {
        Box::new(Named { name, aliases: &[] })
    }

    #[test]
    fn register_and_resolve() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("help")).unwrap();
        reg.register(cmd("home-dir")).unwrap();
        assert_eq!(reg.resolve("help").map(|c| c.name()), Some("help"));
        assert_eq!(reg.resolve("home-dir").map(|c| c.name()), Some("home-dir"));
        assert!(reg.resolve("update").is_none());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("setup")).unwrap();
        assert!(reg.resolve("Setup").is_none());
        assert!(reg.resolve("SETUP").is_none());
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("help")).unwrap();
        let err = reg.register(cmd("help")).unwrap_err();
        assert!(matches!(err, ShellError::DuplicateName(ref n) if n == "help"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn colliding_alias_leaves_registry_unchanged() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("clear")).unwrap();
        let err = reg
            .register(Box::new(Named {
                name: "keymap",
                aliases: &["bindkey", "clear"],
            }))
            .unwrap_err();
        assert!(matches!(err, ShellError::DuplicateName(ref n) if n == "clear"));
        assert!(reg.resolve("keymap").is_none());
        assert!(reg.resolve("bindkey").is_none());
        assert_eq!(reg.names(), vec!["clear"]);
    }

    #[test]
    fn alias_repeated_within_one_command_rejected() {
        let mut reg = CommandRegistry::new();
        let err = reg
            .register(Box::new(Named {
                name: "keymap",
                aliases: &["bindkey", "bindkey"],
            }))
            .unwrap_err();
        assert!(matches!(err, ShellError::DuplicateName(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn declared_aliases_resolve() {
        let mut reg = CommandRegistry::new();
        reg.register(Box::new(Named {
            name: "keymap",
            aliases: &["bindkey"],
        }))
        .unwrap();
        assert_eq!(reg.resolve("bindkey").map(|c| c.name()), Some("keymap"));
        assert_eq!(reg.aliases_of("keymap"), vec!["bindkey"]);
    }

    #[test]
    fn alias_binds_same_command() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("help")).unwrap();
        reg.register(cmd("home-dir")).unwrap();
        reg.alias("home-dir", "hd").unwrap();
        let via_alias = reg.resolve("hd").unwrap();
        let direct = reg.resolve("home-dir").unwrap();
        assert!(std::ptr::addr_eq(via_alias, direct));
    }

    #[test]
    fn alias_of_alias_targets_command() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("home-dir")).unwrap();
        reg.alias("home-dir", "hd").unwrap();
        reg.alias("hd", "home").unwrap();
        assert_eq!(reg.resolve("home").map(|c| c.name()), Some("home-dir"));
        assert_eq!(reg.aliases_of("hd"), vec!["hd", "home"]);
    }

    #[test]
    fn alias_unknown_target() {
        let mut reg = CommandRegistry::new();
        let err = reg.alias("home-dir", "hd").unwrap_err();
        assert!(matches!(err, ShellError::UnknownCommand(ref n) if n == "home-dir"));
        assert!(reg.resolve("hd").is_none());
    }

    #[test]
    fn alias_collision() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("help")).unwrap();
        reg.register(cmd("home-dir")).unwrap();
        let err = reg.alias("home-dir", "help").unwrap_err();
        assert!(matches!(err, ShellError::DuplicateName(_)));
        assert_eq!(reg.resolve("help").map(|c| c.name()), Some("help"));
    }

    #[test]
    fn invalid_names_rejected() {
        let mut reg = CommandRegistry::new();
        assert!(reg.register(cmd("")).is_err());
        assert!(reg.register(cmd("two words")).is_err());
        reg.register(cmd("setup")).unwrap();
        assert!(reg.alias("setup", "s u").is_err());
    }

    #[test]
    fn describe_includes_usage_aliases_and_args() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("setup")).unwrap();
        reg.alias("setup", "init").unwrap();
        let text = reg.describe("init").unwrap();
        assert!(text.starts_with("setup - test command"));
        assert!(text.contains("aliases: init"));
        assert!(text.contains("--force"));
        assert!(reg.describe("missing").is_none());
    }

    #[test]
    fn completions_cover_names_and_aliases() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("help")).unwrap();
        reg.register(cmd("home-dir")).unwrap();
        reg.register(cmd("update")).unwrap();
        reg.alias("home-dir", "hd").unwrap();
        assert_eq!(reg.completions("h"), vec!["hd", "help", "home-dir"]);
        assert_eq!(reg.completions("ho"), vec!["home-dir"]);
        assert!(reg.completions("x").is_empty());
        assert_eq!(reg.completions("").len(), 4);
    }

    #[test]
    fn commands_keep_registration_order() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("update")).unwrap();
        reg.register(cmd("clear")).unwrap();
        let order: Vec<&str> = reg.commands().map(|c| c.name()).collect();
        assert_eq!(order, vec!["update", "clear"]);
        let sorted: Vec<&str> = reg.list_commands().iter().map(|(n, _)| *n).collect();
        assert_eq!(sorted, vec!["clear", "update"]);
    }

    #[test]
    fn arg_spec_display() {
        assert_eq!(ArgSpec::flag("--run", "").display(), "--run");
        assert_eq!(
            ArgSpec::positional("path", "", ValueHint::Path).display(),
            "<path>"
        );
    }
}
