//! External pack generator process.
//!
//! Every generator feature the shell offers runs as a child process described
//! by the `[packager]` config table, inside the generator's home directory.
//! Interactive modes inherit the terminal; the update check captures stdout.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use packshell_terminal::{ConfigEditor, UpdateChecker};
use packshell_types::config::PackagerConfig;
use packshell_types::error::{Result, ShellError};

/// File name the generator writes its configuration to.
pub const CONFIG_FILE: &str = "serverpackcreator.conf";

/// What the generator is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Generate a server pack, optionally from a specific configuration.
    Generate(Option<PathBuf>),
    /// Walk the user through writing a configuration.
    ConfigGen { language: String },
    /// Check for a newer release.
    Update,
}

impl Mode {
    fn args(&self) -> Vec<String> {
        match self {
            Mode::Generate(None) => vec!["-cli".to_string()],
            Mode::Generate(Some(config)) => vec![
                "-cli".to_string(),
                "-config".to_string(),
                config.display().to_string(),
            ],
            Mode::ConfigGen { language } => {
                vec!["-lang".to_string(), language.clone(), "-cgen".to_string()]
            },
            Mode::Update => vec!["-update".to_string()],
        }
    }
}

/// Launcher for the configured generator program.
#[derive(Debug, Clone, Default)]
pub struct Packager {
    program: Option<String>,
    args: Vec<String>,
}

impl Packager {
    pub fn from_config(config: &PackagerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// Program and full argument list for `mode`.
    pub fn command_line(&self, mode: &Mode) -> Result<(String, Vec<String>)> {
        let program = self.program.clone().ok_or_else(|| {
            ShellError::Config("no packager program configured ([packager] program)".to_string())
        })?;
        let mut args = self.args.clone();
        args.extend(mode.args());
        Ok((program, args))
    }

    fn command(&self, mode: &Mode, workdir: &Path) -> Result<Command> {
        let (program, args) = self.command_line(mode)?;
        log::debug!("Launching {program} {} in {}", args.join(" "), workdir.display());
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(workdir);
        Ok(cmd)
    }

    /// Run with the terminal attached and wait for it to finish.
    pub fn run(&self, mode: &Mode, workdir: &Path) -> Result<()> {
        let status = self.command(mode, workdir)?.status()?;
        if !status.success() {
            return Err(ShellError::Command(format!("packager exited with {status}")));
        }
        Ok(())
    }

    /// Run and return what the generator printed.
    pub fn capture(&self, mode: &Mode, workdir: &Path) -> Result<String> {
        let output = self
            .command(mode, workdir)?
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;
        if !output.status.success() {
            return Err(ShellError::Command(format!(
                "packager exited with {}",
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ConfigEditor for Packager {
    fn edit(&mut self, home: &Path, language: &str) -> Result<PathBuf> {
        self.run(
            &Mode::ConfigGen {
                language: language.to_string(),
            },
            home,
        )?;
        Ok(home.join(CONFIG_FILE))
    }
}

impl UpdateChecker for Packager {
    fn check(&mut self, home: &Path) -> Result<String> {
        let report = self.capture(&Mode::Update, home)?;
        if report.is_empty() {
            return Ok("No updates available.".to_string());
        }
        Ok(report)
    }
}
