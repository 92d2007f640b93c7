//! Pack generator commands: config-gen, home-dir, language, run-headless,
//! setup, update.
//!
//! Each command validates its arguments and hands the work to one of the
//! collaborators in [`Services`](crate::services::Services).

use std::path::Path;

use packshell_types::error::{Result, ShellError};

use crate::interpreter::{
    ArgKind, ArgSpec, Command, CommandOutput, CommandRegistry, Environment, ValueHint,
};
use crate::services::{KNOWN_LOCALES, SetupReport, is_locale_tag};

/// Register the application commands and their short aliases.
pub fn register_app_commands(reg: &mut CommandRegistry) -> Result<()> {
    reg.register(Box::new(ConfigGenCmd))?;
    reg.register(Box::new(HomeDirCmd))?;
    reg.register(Box::new(LanguageCmd))?;
    reg.register(Box::new(RunHeadlessCmd))?;
    reg.register(Box::new(SetupCmd))?;
    reg.register(Box::new(UpdateCmd))?;
    reg.alias("home-dir", "hd")?;
    Ok(())
}

/// Split `args` into flags and positionals, checking both against the schema.
fn split_args<'a>(cmd: &dyn Command, args: &[&'a str]) -> Result<(Vec<&'a str>, Vec<&'a str>)> {
    let usage = || ShellError::Usage(cmd.usage().to_string());
    let schema = cmd.args();
    let (flags, positionals): (Vec<&str>, Vec<&str>) =
        args.iter().copied().partition(|a| a.starts_with("--"));

    for flag in &flags {
        if !schema.iter().any(|s| s.kind == ArgKind::Flag && s.name == *flag) {
            return Err(usage());
        }
    }
    let max_positionals = schema
        .iter()
        .filter(|s| s.kind == ArgKind::Positional)
        .count();
    if positionals.len() > max_positionals {
        return Err(usage());
    }
    Ok((flags, positionals))
}

// ---------------------------------------------------------------------------
// config-gen
// ---------------------------------------------------------------------------

struct ConfigGenCmd;

const CONFIG_GEN_ARGS: &[ArgSpec] = &[ArgSpec::flag(
    "--run",
    "Generate the server pack right after writing the configuration",
)];

impl Command for ConfigGenCmd {
    fn name(&self) -> &str {
        "config-gen"
    }
    fn description(&self) -> &str {
        "Interactively create a server pack configuration"
    }
    fn usage(&self) -> &str {
        "config-gen [--run]"
    }
    fn category(&self) -> &str {
        "application"
    }
    fn args(&self) -> &[ArgSpec] {
        CONFIG_GEN_ARGS
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (flags, _) = split_args(self, args)?;
        let run = flags.contains(&"--run");

        let home = env.services.api.home_directory();
        let language = env.services.api.language();
        let config = env.services.config_editor.edit(&home, &language)?;
        log::info!("Configuration written to {}", config.display());

        if run {
            env.services.api.run_headless(Some(&config))?;
            return Ok(CommandOutput::Text(format!(
                "Configuration written to {}\nServer pack generated.",
                config.display()
            )));
        }
        Ok(CommandOutput::Text(format!(
            "Configuration written to {}",
            config.display()
        )))
    }
}

// ---------------------------------------------------------------------------
// home-dir
// ---------------------------------------------------------------------------

struct HomeDirCmd;

const HOME_DIR_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "path",
    "New home directory",
    ValueHint::Path,
)];

impl Command for HomeDirCmd {
    fn name(&self) -> &str {
        "home-dir"
    }
    fn description(&self) -> &str {
        "Show or change the home directory"
    }
    fn usage(&self) -> &str {
        "home-dir [path]"
    }
    fn category(&self) -> &str {
        "application"
    }
    fn args(&self) -> &[ArgSpec] {
        HOME_DIR_ARGS
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (_, positionals) = split_args(self, args)?;
        match positionals.first() {
            None => Ok(CommandOutput::Text(
                env.services.api.home_directory().display().to_string(),
            )),
            Some(path) => {
                let home = env.services.api.set_home_directory(Path::new(path))?;
                Ok(CommandOutput::Text(format!(
                    "Home directory set to {}",
                    home.display()
                )))
            },
        }
    }
}

// ---------------------------------------------------------------------------
// language
// ---------------------------------------------------------------------------

struct LanguageCmd;

const LANGUAGE_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "locale",
    "Locale tag such as en_GB",
    ValueHint::OneOf(KNOWN_LOCALES),
)];

impl Command for LanguageCmd {
    fn name(&self) -> &str {
        "language"
    }
    fn description(&self) -> &str {
        "Show or change the active language"
    }
    fn usage(&self) -> &str {
        "language [locale]"
    }
    fn category(&self) -> &str {
        "application"
    }
    fn args(&self) -> &[ArgSpec] {
        LANGUAGE_ARGS
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (_, positionals) = split_args(self, args)?;
        let Some(&locale) = positionals.first() else {
            return Ok(CommandOutput::Text(format!(
                "Current language: {}",
                env.services.api.language()
            )));
        };
        if !is_locale_tag(locale) {
            return Err(ShellError::Command(format!(
                "invalid locale tag {locale:?}, expected e.g. en_GB"
            )));
        }
        env.services.api.set_language(locale)?;
        Ok(CommandOutput::Text(format!("Language set to {locale}")))
    }
}

// ---------------------------------------------------------------------------
// run-headless
// ---------------------------------------------------------------------------

struct RunHeadlessCmd;

const RUN_HEADLESS_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "config",
    "Configuration file to generate from",
    ValueHint::Path,
)];

impl Command for RunHeadlessCmd {
    fn name(&self) -> &str {
        "run-headless"
    }
    fn description(&self) -> &str {
        "Generate a server pack without prompting"
    }
    fn usage(&self) -> &str {
        "run-headless [config]"
    }
    fn category(&self) -> &str {
        "application"
    }
    fn args(&self) -> &[ArgSpec] {
        RUN_HEADLESS_ARGS
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (_, positionals) = split_args(self, args)?;
        let config = positionals.first().map(Path::new);
        env.services.api.run_headless(config)?;
        Ok(CommandOutput::Text("Server pack generated.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// setup
// ---------------------------------------------------------------------------

struct SetupCmd;

const SETUP_ARGS: &[ArgSpec] = &[ArgSpec::flag("--force", "Rewrite default files")];

impl Command for SetupCmd {
    fn name(&self) -> &str {
        "setup"
    }
    fn description(&self) -> &str {
        "Prepare the home directory for first use"
    }
    fn usage(&self) -> &str {
        "setup [--force]"
    }
    fn category(&self) -> &str {
        "application"
    }
    fn args(&self) -> &[ArgSpec] {
        SETUP_ARGS
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (flags, _) = split_args(self, args)?;
        let force = flags.contains(&"--force");
        let report = env.services.api.setup(force)?;
        if report.is_empty() {
            return Ok(CommandOutput::Text(format!(
                "Setup complete, nothing to do in {}",
                env.services.api.home_directory().display()
            )));
        }
        Ok(CommandOutput::Text(format_report(&report)))
    }
}

fn format_report(report: &SetupReport) -> String {
    let mut out = String::from("Setup complete:");
    for path in &report.created {
        out.push_str(&format!("\n  created      {}", path.display()));
    }
    for (from, to) in &report.renamed {
        out.push_str(&format!(
            "\n  renamed      {} -> {}",
            from.display(),
            to.display()
        ));
    }
    for path in &report.overwritten {
        out.push_str(&format!("\n  overwritten  {}", path.display()));
    }
    out
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

struct UpdateCmd;
impl Command for UpdateCmd {
    fn name(&self) -> &str {
        "update"
    }
    fn description(&self) -> &str {
        "Check for a newer release"
    }
    fn usage(&self) -> &str {
        "update"
    }
    fn category(&self) -> &str {
        "application"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if !args.is_empty() {
            return Err(ShellError::Usage(self.usage().to_string()));
        }
        let home = env.services.api.home_directory();
        Ok(CommandOutput::Text(env.services.updates.check(&home)?))
    }
}
