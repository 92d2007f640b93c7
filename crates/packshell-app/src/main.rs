//! packshell entry point.
//!
//! Interactive shell around the server pack generator. Type `help` for the
//! command list, Tab to complete, Alt-S to toggle usage hints, Ctrl-D to quit.

mod local_api;
mod packager;
mod setup;

use std::path::PathBuf;

use anyhow::Result;

use local_api::LocalApi;
use packager::Packager;
use packshell_terminal::{
    CommandRegistry, EditorSettings, LineEditor, Services, Session, register_app_commands,
    register_builtins,
};
use packshell_types::config::ShellConfig;

/// Config file used when neither an argument nor `PACKSHELL_CONFIG` names one.
const DEFAULT_CONFIG_PATH: &str = "packshell.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Resolve config from CLI arg, PACKSHELL_CONFIG env var, or the default path.
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PACKSHELL_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = ShellConfig::load(&config_path)?;
    log::info!(
        "Starting packshell (config {}, language {})",
        config_path.display(),
        config.language
    );

    let settings = EditorSettings::from_config(&config);
    let prompt = config.prompt.clone();
    let packager = Packager::from_config(&config.packager);
    let services = Services {
        api: Box::new(LocalApi::new(config, config_path, packager.clone())),
        updates: Box::new(packager.clone()),
        config_editor: Box::new(packager),
    };

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry)?;
    register_app_commands(&mut registry)?;

    let session = match Session::start(registry, services, prompt, std::io::stdout(), |reg| {
        LineEditor::new(reg, &settings)
    }) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Error initializing terminal: {e}");
            return Ok(());
        },
    };
    session.run();
    Ok(())
}
