use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
pub mod tests;

pub const APP_NAME: &str = "qadapter";
pub const LOCAL_SETTINGS_FILE: &str = "qadapter.conf";

#[derive(Error, Debug)]
pub enum SettingsError {
  #[error("Filesystem error: {0}")]
  FilesystemError(#[from] std::io::Error),
  #[error("IO Error: {0}")]
  ConfyError(#[from] confy::ConfyError),
  #[error("Settings file not found in {0:?}")]
  SettingsNotFound(PathBuf),
  #[error(
    "No adapter configuration given. Pass --adapter or store a default with the `set-default` command."
  )]
  NoDefaultAdapter,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct QadapterSettings {
  pub default_adapter: Option<PathBuf>,
}

pub fn get_settings_global() -> Result<QadapterSettings, SettingsError> {
  Ok(confy::load(APP_NAME, "config")?)
}

pub fn set_settings_global(settings: &QadapterSettings) -> Result<(), SettingsError> {
  confy::store(APP_NAME, "config", settings)?;
  Ok(())
}

pub fn get_settings_local(dir: &Path) -> Result<QadapterSettings, SettingsError> {
  let path = dir.join(LOCAL_SETTINGS_FILE);
  if !path.is_file() {
    return Err(SettingsError::SettingsNotFound(dir.to_path_buf()));
  }
  Ok(confy::load_path(path)?)
}

pub fn set_settings_local(dir: &Path, settings: &QadapterSettings) -> Result<(), SettingsError> {
  confy::store_path(dir.join(LOCAL_SETTINGS_FILE), settings)?;
  Ok(())
}

/// Searches for a local settings file starting from `start` and moving up
/// the directory tree until it finds one or reaches the user's home
/// directory.
pub fn find_local_settings_dir(start: &Path) -> Option<PathBuf> {
  let home = dirs::home_dir().unwrap_or(PathBuf::from("/"));
  let mut dir = start.to_path_buf();

  loop {
    if dir.join(LOCAL_SETTINGS_FILE).is_file() {
      return Some(dir);
    }
    if dir == home || !dir.pop() {
      return None;
    }
  }
}

/// Default adapter configuration path: local settings win over global ones.
pub fn resolve_default_adapter() -> Result<PathBuf, SettingsError> {
  let cwd = std::env::current_dir()?;
  if let Some(dir) = find_local_settings_dir(&cwd) {
    if let Some(path) = get_settings_local(&dir)?.default_adapter {
      return Ok(path);
    }
  }
  get_settings_global()?
    .default_adapter
    .ok_or(SettingsError::NoDefaultAdapter)
}
