//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application directory name under the XDG config home.
const APP_DIR: &str = "reelscout";

/// Resolves the config file path.
///
/// Resolution order:
/// 1. `{dir}/config.toml` when `--dir` is given.
/// 2. `$XDG_CONFIG_HOME/reelscout/config.toml` when `XDG_CONFIG_HOME` is set and non-empty.
/// 3. `~/.config/reelscout/config.toml`.
///
/// # Errors
///
/// Returns an error if neither `--dir`, `XDG_CONFIG_HOME` nor `HOME` is available.
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }

    let xdg = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty());
    if let Some(xdg) = xdg {
        return Ok(under_config_home(Path::new(&xdg)));
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(under_config_home(&PathBuf::from(home).join(".config")))
}

/// Returns `{config_home}/reelscout/config.toml`.
fn under_config_home(config_home: &Path) -> PathBuf {
    config_home.join(APP_DIR).join(CONFIG_FILE)
}
