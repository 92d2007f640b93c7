//! Shell configuration loaded from `packshell.toml`.
//!
//! ```toml
//! prompt = "ServerPackCreator> "
//! list_max = 50
//! tail_tip = true
//! edit_mode = "emacs"
//! history_size = 500
//! home_directory = "/srv/serverpackcreator"
//! language = "en_GB"
//!
//! [packager]
//! program = "java"
//! args = ["-jar", "ServerPackCreator.jar"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};

/// Key binding set used by the line editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Emacs,
    Vi,
}

/// External pack generator process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagerConfig {
    /// Executable to launch. `None` leaves generation commands unavailable.
    #[serde(default)]
    pub program: Option<String>,
    /// Arguments placed before the mode flag.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Top-level shell configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Maximum number of completion candidates offered at once.
    #[serde(default = "default_list_max")]
    pub list_max: usize,
    /// Whether the tail-tip hint is shown when the session starts.
    #[serde(default = "yes")]
    pub tail_tip: bool,
    #[serde(default)]
    pub edit_mode: EditMode,
    /// In-memory history capacity.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Home directory of the pack generator. Falls back to the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_directory: Option<PathBuf>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub packager: PackagerConfig,
}

fn default_prompt() -> String {
    "ServerPackCreator> ".to_string()
}
fn default_list_max() -> usize {
    50
}
fn yes() -> bool {
    true
}
fn default_history_size() -> usize {
    500
}
fn default_language() -> String {
    "en_GB".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            list_max: default_list_max(),
            tail_tip: true,
            edit_mode: EditMode::default(),
            history_size: default_history_size(),
            home_directory: None,
            language: default_language(),
            packager: PackagerConfig::default(),
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
            .map_err(|e| ShellError::Config(format!("{}: {e}", path.display())))
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.list_max == 0 {
            return Err(ShellError::Config("list_max must be at least 1".into()));
        }
        if self.prompt.is_empty() {
            return Err(ShellError::Config("prompt must not be empty".into()));
        }
        Ok(())
    }
}
