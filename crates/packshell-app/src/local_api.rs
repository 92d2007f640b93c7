//! `PackagingApi` backed by the shell config file and the external packager.

use std::path::{Path, PathBuf};

use packshell_terminal::services::is_locale_tag;
use packshell_terminal::{PackagingApi, SetupReport};
use packshell_types::config::ShellConfig;
use packshell_types::error::{Result, ShellError};

use crate::packager::{Mode, Packager};
use crate::setup;

/// Settings changes are written back to `config_path` immediately.
pub struct LocalApi {
    config: ShellConfig,
    config_path: PathBuf,
    packager: Packager,
}

impl LocalApi {
    pub fn new(config: ShellConfig, config_path: PathBuf, packager: Packager) -> Self {
        Self {
            config,
            config_path,
            packager,
        }
    }

    fn persist(&self) -> Result<()> {
        self.config.save(&self.config_path)
    }
}

impl PackagingApi for LocalApi {
    fn home_directory(&self) -> PathBuf {
        match &self.config.home_directory {
            Some(home) => home.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    fn set_home_directory(&mut self, path: &Path) -> Result<PathBuf> {
        let target = self.home_directory().join(path);
        if !target.is_dir() {
            return Err(ShellError::Command(format!(
                "{} is not a directory",
                target.display()
            )));
        }
        let resolved = target.canonicalize()?;
        self.config.home_directory = Some(resolved.clone());
        self.persist()?;
        log::info!("Home directory is now {}", resolved.display());
        Ok(resolved)
    }

    fn language(&self) -> String {
        self.config.language.clone()
    }

    fn set_language(&mut self, locale: &str) -> Result<()> {
        if !is_locale_tag(locale) {
            return Err(ShellError::Command(format!("invalid locale tag {locale:?}")));
        }
        self.config.language = locale.to_string();
        self.persist()?;
        log::info!("Language is now {locale}");
        Ok(())
    }

    fn setup(&mut self, force: bool) -> Result<SetupReport> {
        setup::prepare(&self.home_directory(), force)
    }

    fn run_headless(&mut self, config: Option<&Path>) -> Result<()> {
        let home = self.home_directory();
        let config = config.map(|c| home.join(c));
        self.packager.run(&Mode::Generate(config), &home)
    }
}
