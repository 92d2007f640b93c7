//! Narrow interfaces to the pack generator.
//!
//! The shell never packages anything itself. Application commands reach the
//! generator through these traits, and the binary decides what backs them.

use std::path::{Path, PathBuf};

use packshell_types::error::Result;

/// Home directory, locale, setup and headless generation.
pub trait PackagingApi {
    /// Directory the generator works in.
    fn home_directory(&self) -> PathBuf;

    /// Change the home directory. Returns the resolved path.
    fn set_home_directory(&mut self, path: &Path) -> Result<PathBuf>;

    /// Active locale tag, e.g. `en_GB`.
    fn language(&self) -> String;

    fn set_language(&mut self, locale: &str) -> Result<()>;

    /// Prepare the home directory. `force` rewrites default files.
    fn setup(&mut self, force: bool) -> Result<SetupReport>;

    /// Generate a server pack without prompting, optionally from a specific
    /// configuration file.
    fn run_headless(&mut self, config: Option<&Path>) -> Result<()>;
}

/// Checks for newer releases of the generator.
pub trait UpdateChecker {
    /// Returns a human-readable report. Runs in the generator's home directory.
    fn check(&mut self, home: &Path) -> Result<String>;
}

/// Interactive editor producing a server pack configuration.
pub trait ConfigEditor {
    /// Run the editor and return the path of the written configuration.
    fn edit(&mut self, home: &Path, language: &str) -> Result<PathBuf>;
}

/// Files touched by [`PackagingApi::setup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub created: Vec<PathBuf>,
    pub overwritten: Vec<PathBuf>,
    /// `(from, to)` pairs of legacy files moved to their current name.
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

impl SetupReport {
    /// True when setup found everything in place.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.overwritten.is_empty() && self.renamed.is_empty()
    }
}

/// The collaborators available to every command.
pub struct Services {
    pub api: Box<dyn PackagingApi>,
    pub updates: Box<dyn UpdateChecker>,
    pub config_editor: Box<dyn ConfigEditor>,
}

/// Locales offered for completion by `language`.
pub const KNOWN_LOCALES: &[&str] = &[
    "de_DE", "en_GB", "en_US", "es_ES", "fr_FR", "it_IT", "ja_JP", "nl_NL", "pl_PL", "pt_BR",
    "ru_RU", "sv_SE", "uk_UA", "zh_CN",
];

/// Whether `tag` has the `ll_CC` shape (lowercase language, uppercase country).
pub fn is_locale_tag(tag: &str) -> bool {
    let Some((lang, country)) = tag.split_once('_') else {
        return false;
    };
    lang.len() == 2
        && country.len() == 2
        && lang.chars().all(|c| c.is_ascii_lowercase())
        && country.chars().all(|c| c.is_ascii_uppercase())
}
