pub mod adapter;
pub mod command;
pub mod config_files;
pub mod parsers;
pub mod qlogger;
pub mod queue_type;
pub mod settings;

#[cfg(test)]
mod tests;

use std::path::Path;

use env_logger::Env;

pub use adapter::{AdapterError, ConfigMap, QueueAdapter};
pub use parsers::JobId;
pub use queue_type::QueueType;

#[derive(thiserror::Error, Debug)]
pub enum QadapterError {
  #[error("Adapter Error: {0}")]
  AdapterError(#[from] adapter::AdapterError),
  #[error("Config File Error: {0}")]
  ConfigFileError(#[from] config_files::ConfigFileError),
  #[error("Settings Error: {0}")]
  SettingsError(#[from] settings::SettingsError),
}

/// Starts `env_logger` at `info` unless `RUST_LOG` says otherwise. Safe to
/// call more than once.
pub fn init_logging() {
  let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}

pub fn load_adapter(path: &Path) -> Result<QueueAdapter, QadapterError> {
  let config = config_files::load_config_map(path)?;
  Ok(QueueAdapter::from_config(&config)?)
}

pub fn save_adapter(adapter: &QueueAdapter, path: &Path) -> Result<(), QadapterError> {
  config_files::save_config_map(path, &adapter.to_config())?;
  Ok(())
}

/// Loads the adapter at `path`, or the stored default when no path is given.
pub fn resolve_adapter(path: Option<&Path>) -> Result<QueueAdapter, QadapterError> {
  match path {
    Some(path) => load_adapter(path),
    None => load_adapter(&settings::resolve_default_adapter()?),
  }
}
