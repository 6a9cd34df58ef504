//! Centralized path management for SnipTerm.
//!
//! Directories are lazily initialized and cached.
//! Use `set_config_dir` before first access to relocate the config
//! (the binary does this for `SNIPTERM_CONFIG_DIR`).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Name of the application directory under the platform config root.
pub const APP_DIR_NAME: &str = "snipterm";

/// Name of the snippet configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// ~/.config/snipterm (or platform equivalent)
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    })
}

/// Override config dir. Has no effect after the first `config_dir()` call.
pub fn set_config_dir(path: PathBuf) {
    let _ = CONFIG_DIR.set(path);
}

/// Config file path: config_dir()/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// The user's home directory, if the platform reports one.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Expand a leading `~` or `~/` against the home directory.
///
/// Other paths, and `~user` forms, are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match home_dir() {
        Some(home) if rest.as_os_str().is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
