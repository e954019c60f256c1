//! Shared path helpers for InstallTheCli crates

use camino::Utf8PathBuf;
use std::path::PathBuf;

/// Application directory name under the platform state/config roots
pub const APP_DIR_NAME: &str = "InstallTheCli";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "installthecli.yaml";

/// Get the user's home directory
///
/// Prefers the HOME environment variable over `dirs::home_dir()` so that
/// an overridden HOME (containers, sudo -E) is respected.
pub fn get_home_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME").filter(|h| !h.is_empty()) {
        return Some(PathBuf::from(home));
    }
    dirs::home_dir()
}

/// Directory for generated scripts and the last-run log
///
/// `%LocalAppData%\InstallTheCli` on Windows, `$XDG_STATE_HOME/InstallTheCli`
/// or `~/.local/state/InstallTheCli` elsewhere.
pub fn state_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        return dirs::data_local_dir().map(|d| d.join(APP_DIR_NAME));
    }
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR_NAME));
    }
    get_home_dir().map(|h| h.join(".local").join("state").join(APP_DIR_NAME))
}

/// Default configuration file location, `<config_dir>/installthecli/installthecli.yaml`
pub fn default_config_path() -> Option<Utf8PathBuf> {
    let dir = dirs::config_dir()?;
    let path = dir.join("installthecli").join(CONFIG_FILE_NAME);
    Utf8PathBuf::from_path_buf(path).ok()
}
