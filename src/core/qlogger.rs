
use std::error::Error;

use log::{error, info};

/// Sink for the adapter's progress and failure reports.
///
/// `logger` is the per-adapter name, `qadapter.<queue name>`.
pub trait QueueLogger {
  fn info(&self, logger: &str, message: &str);
  fn error(&self, logger: &str, messages: &[String]);
  fn exception(&self, logger: &str, message: &str, error: &dyn Error);
}

/// Forwards to the `log` facade, using the logger name as target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogQueueLogger;

impl QueueLogger for LogQueueLogger {
  fn info(&self, logger: &str, message: &str) {
    info!(target: logger, "{}", message);
  }

  fn error(&self, logger: &str, messages: &[String]) {
    error!(target: logger, "{}", messages.join("\n"));
  }

  fn exception(&self, logger: &str, message: &str, err: &dyn Error) {
    error!(target: logger, "{}\n{}", message, describe_error(err));
  }
}

/// Error message followed by its `source()` chain, one cause per line.
pub fn describe_error(err: &dyn Error) -> String {
  let mut description = err.to_string();
  let mut cause = err.source();
  while let Some(inner) = cause {
    description.push_str(&format!("\n  caused by: {}", inner));
    cause = inner.source();
  }
  description
}
