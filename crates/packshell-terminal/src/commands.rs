//! Shell builtins: help, clear, history, keymap, exit.

use std::collections::BTreeMap;

use packshell_types::error::{Result, ShellError};

use crate::interpreter::{
    ArgSpec, Command, CommandOutput, CommandRegistry, Environment, ValueHint,
};

/// Register the shell-level commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) -> Result<()> {
    reg.register(Box::new(HelpCmd))?;
    reg.register(Box::new(ClearCmd))?;
    reg.register(Box::new(HistoryCmd))?;
    reg.register(Box::new(KeymapCmd))?;
    reg.register(Box::new(ExitCmd))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;

const HELP_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "command",
    "Command to describe",
    ValueHint::CommandName,
)];

impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "List commands or describe one"
    }
    fn usage(&self) -> &str {
        "help [command]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn args(&self) -> &[ArgSpec] {
        HELP_ARGS
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let reg = env.registry;
        if let Some(&name) = args.first() {
            let cmd = reg
                .resolve(name)
                .ok_or_else(|| ShellError::UnknownCommand(name.to_string()))?;
            let details = reg.describe(name).unwrap_or_default();
            return Ok(CommandOutput::Text(format!(
                "{} ({})\n  {details}",
                cmd.name(),
                cmd.category()
            )));
        }

        // Group commands by category.
        let mut categories: BTreeMap<&str, Vec<&dyn Command>> = BTreeMap::new();
        for cmd in reg.commands() {
            categories.entry(cmd.category()).or_default().push(cmd);
        }

        let mut out = format!("Commands ({}):\n", reg.len());
        for (category, cmds) in &mut categories {
            cmds.sort_by_key(|c| c.name());
            out.push_str(&format!("\n  [{category}]\n"));
            for cmd in cmds.iter() {
                let aliases = reg.aliases_of(cmd.name());
                let label = if aliases.is_empty() {
                    cmd.name().to_string()
                } else {
                    format!("{} ({})", cmd.name(), aliases.join(", "))
                };
                out.push_str(&format!("    {label:18} {}\n", cmd.description()));
            }
        }
        out.push_str("\nType 'help <command>' for details. Alt-S toggles usage hints.");
        Ok(CommandOutput::Text(out))
    }
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the screen"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct HistoryCmd;

const HISTORY_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "count",
    "Show only the most recent entries",
    ValueHint::None,
)];

impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Show lines entered this session"
    }
    fn usage(&self) -> &str {
        "history [count]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn args(&self) -> &[ArgSpec] {
        HISTORY_ARGS
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let hist = env.history;
        let skip = match args.first() {
            Some(n) => {
                let n: usize = n
                    .parse()
                    .map_err(|_| ShellError::Usage(self.usage().to_string()))?;
                hist.len().saturating_sub(n)
            },
            None => 0,
        };
        if hist.is_empty() {
            return Ok(CommandOutput::Text("(no history)".to_string()));
        }
        let mut out = String::new();
        for (i, entry) in hist.iter().enumerate().skip(skip) {
            out.push_str(&format!("  {:4}  {entry}\n", i + 1));
        }
        Ok(CommandOutput::Text(out.trim_end().to_string()))
    }
}

// ---------------------------------------------------------------------------
// keymap
// ---------------------------------------------------------------------------

struct KeymapCmd;
impl Command for KeymapCmd {
    fn name(&self) -> &str {
        "keymap"
    }
    fn description(&self) -> &str {
        "List key bindings"
    }
    fn usage(&self) -> &str {
        "keymap"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn aliases(&self) -> &[&str] {
        &["bindkey"]
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if env.key_bindings.is_empty() {
            return Ok(CommandOutput::Text("(no key bindings)".to_string()));
        }
        Ok(CommandOutput::Table {
            headers: vec!["KEYS".to_string(), "ACTION".to_string()],
            rows: env
                .key_bindings
                .iter()
                .map(|b| vec![b.keys.clone(), b.action.clone()])
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// exit
// ---------------------------------------------------------------------------

struct ExitCmd;
impl Command for ExitCmd {
    fn name(&self) -> &str {
        "exit"
    }
    fn description(&self) -> &str {
        "Leave the shell (same as Ctrl-D)"
    }
    fn usage(&self) -> &str {
        "exit"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Exit)
    }
}
