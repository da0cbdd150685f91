use std::{
    env,
    path::{Path, PathBuf},
};

use etcetera::BaseStrategy;

pub const CONFIG_FILE_NAME: &str = "groovy-imports.toml";
const APP_DIR_NAME: &str = "groovy-imports";

/// The user configuration file, when one exists.
///
/// Lives in the platform config directory: `%APPDATA%` on Windows,
/// `$XDG_CONFIG_HOME` or `~/.config` elsewhere.
pub fn user_config_file() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    let candidate = strategy.config_dir().join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

#[cfg(not(windows))]
fn locate_system_config_xdg(value: Option<&str>) -> Option<PathBuf> {
    // On Linux and macOS, read the `XDG_CONFIG_DIRS` environment variable.
    let default = "/etc/xdg";
    let config_dirs = value.filter(|s| !s.is_empty()).unwrap_or(default);

    for dir in config_dirs.split(':').take_while(|s| !s.is_empty()) {
        let candidate = Path::new(dir).join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(windows)]
fn locate_system_config_windows(system_drive: impl AsRef<Path>) -> Option<PathBuf> {
    // %SYSTEMDRIVE%\ProgramData\groovy-imports\groovy-imports.toml
    let candidate = system_drive
        .as_ref()
        .join("ProgramData")
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME);
    candidate.as_path().is_file().then_some(candidate)
}

/// Returns the path to the system configuration file.
///
/// On Unix-like systems, uses the `XDG_CONFIG_DIRS` environment variable (falling back to
/// `/etc/xdg` if unset or empty) and then `/etc/groovy-imports/groovy-imports.toml`.
///
/// On Windows, uses `%SYSTEMDRIVE%\ProgramData\groovy-imports\groovy-imports.toml`.
pub fn system_config_file() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        env::var("SYSTEMDRIVE")
            .ok()
            .and_then(|system_drive| locate_system_config_windows(PathBuf::from(system_drive)))
    }

    #[cfg(not(windows))]
    {
        if let Some(path) = locate_system_config_xdg(env::var("XDG_CONFIG_DIRS").ok().as_deref()) {
            return Some(path);
        }

        let candidate = Path::new("/etc").join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        match candidate.try_exists() {
            Ok(true) => Some(candidate),
            Ok(false) => None,
            Err(err) => {
                log::warn!("Failed to query system configuration file: {err}");
                None
            }
        }
    }
}
