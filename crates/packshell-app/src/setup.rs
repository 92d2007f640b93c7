//! First-run layout of the generator's home directory.

use std::fs;
use std::path::Path;

use packshell_terminal::SetupReport;
use packshell_types::error::Result;

use crate::packager::CONFIG_FILE;

/// Configuration file name used by older releases.
pub const LEGACY_CONFIG_FILE: &str = "creator.conf";

const DIRECTORIES: &[&str] = &["server-packs", "work", "plugins", "logs"];

const DEFAULT_CONFIG: &str = r#"modpackDir = ""
clientMods = []
copyDirs = ["config", "mods"]
includeServerInstallation = true
javaPath = ""
minecraftVersion = ""
modLoader = "Forge"
modLoaderVersion = ""
includeServerIcon = true
includeServerProperties = true
includeZipCreation = true
serverPackSuffix = ""
"#;

const DEFAULT_PROPERTIES: &str = "\
allow-flight=true
difficulty=easy
enable-command-block=true
max-players=20
motd=A Minecraft server pack
online-mode=true
server-port=25565
view-distance=10
";

/// Default files and their contents, relative to the home directory.
const DEFAULT_FILES: &[(&str, &str)] = &[
    (CONFIG_FILE, DEFAULT_CONFIG),
    ("server.properties", DEFAULT_PROPERTIES),
];

/// Create missing directories and default files under `home`.
///
/// A legacy `creator.conf` is renamed to the current name when no current
/// configuration exists yet. With `force`, default files that already exist
/// are rewritten.
pub fn prepare(home: &Path, force: bool) -> Result<SetupReport> {
    let mut report = SetupReport::default();

    if !home.is_dir() {
        fs::create_dir_all(home)?;
        report.created.push(home.to_path_buf());
    }

    for dir in DIRECTORIES {
        let path = home.join(dir);
        if !path.is_dir() {
            fs::create_dir_all(&path)?;
            report.created.push(path);
        }
    }

    let legacy = home.join(LEGACY_CONFIG_FILE);
    let current = home.join(CONFIG_FILE);
    if legacy.is_file() {
        if current.exists() {
            log::warn!(
                "Both {} and {} exist, leaving the legacy file alone",
                legacy.display(),
                current.display()
            );
        } else {
            fs::rename(&legacy, &current)?;
            log::info!("Renamed {} to {}", legacy.display(), current.display());
            report.renamed.push((legacy, current));
        }
    }

    for (name, contents) in DEFAULT_FILES {
        let path = home.join(name);
        if !path.exists() {
            fs::write(&path, contents)?;
            report.created.push(path);
        } else if force {
            fs::write(&path, contents)?;
            report.overwritten.push(path);
        }
    }

    if report.is_empty() {
        log::info!("Setup complete, {} already prepared", home.display());
    } else {
        log::warn!(
            "Setup touched {} file(s) in {}, check them before generating",
            report.created.len() + report.overwritten.len() + report.renamed.len(),
            home.display()
        );
    }
    Ok(report)
}
