
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::core::command::{CommandError, CommandRunner, SystemCommandRunner};
use crate::core::parsers::JobId;
use crate::core::qlogger::{LogQueueLogger, QueueLogger};
use crate::core::queue_type::QueueType;

/// Flat key/value mapping used for options and persisted configurations.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Keys starting with this prefix belong to the adapter itself.
pub const RESERVED_PREFIX: &str = "_fw";
pub const KIND_KEY: &str = "_fw_name";
pub const QUEUE_TYPE_KEY: &str = "_fw_q_type";
pub const QUEUE_NAME_KEY: &str = "_fw_q_name";
pub const TEMPLATE_FILE_KEY: &str = "_fw_template_file";
pub const ADAPTER_KIND: &str = "CommonAdapter";

pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum AdapterError {
  #[error("{given} is not a supported queue type. Supported types are {supported:?}")]
  UnsupportedQueueType {
    given: String,
    supported: &'static [&'static str],
  },
  #[error("Cannot find script file located at: {0:?}")]
  ScriptNotFound(PathBuf),
  #[error("Option key \"{0}\" uses the reserved \"_fw\" prefix")]
  ReservedOptionKey(String),
  #[error("Missing Key: {0}")]
  MissingKey(String),
  #[error("Wrong type for value of \"{0}\", expected type {1}")]
  WrongType(String, String),
  #[error("Configuration describes a \"{0}\", not a CommonAdapter")]
  UnknownAdapterKind(String),
  #[error("Invalid template path {path:?}")]
  TemplatePath {
    path: PathBuf,
    source: std::io::Error,
  },
}

/// Submits scripts to a PBS, SGE or SLURM queue and counts a user's jobs.
///
/// Holds no per-call state, one instance can serve any number of calls.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueAdapter {
  queue_type: QueueType,
  queue_name: String,
  template_file: PathBuf,
  options: ConfigMap,
}

impl QueueAdapter {
  /// Builds an adapter from a queue type name such as `"PBS"`.
  pub fn create(
    queue_type: &str,
    queue_name: Option<&str>,
    template_file: Option<&Path>,
    options: ConfigMap,
  ) -> Result<Self, AdapterError> {
    let queue_type =
      QueueType::from_str(queue_type).map_err(|_| AdapterError::UnsupportedQueueType {
        given: queue_type.to_string(),
        supported: QueueType::supported(),
      })?;
    Self::new(queue_type, queue_name, template_file, options)
  }

  pub fn new(
    queue_type: QueueType,
    queue_name: Option<&str>,
    template_file: Option<&Path>,
    options: ConfigMap,
  ) -> Result<Self, AdapterError> {
    if let Some(key) = options.keys().find(|k| k.starts_with(RESERVED_PREFIX)) {
      return Err(AdapterError::ReservedOptionKey(key.clone()));
    }

    let template_file = match template_file {
      Some(path) => std::path::absolute(path).map_err(|source| AdapterError::TemplatePath {
        path: path.to_path_buf(),
        source,
      })?,
      None => Self::default_template_file(queue_type),
    };

    let queue_name = match queue_name {
      Some(name) if !name.is_empty() => name.to_string(),
      _ => queue_type.to_string(),
    };

    Ok(QueueAdapter {
      queue_type,
      queue_name,
      template_file,
      options,
    })
  }

  /// Built-in template shipped in the crate's `templates` directory.
  pub fn default_template_file(queue_type: QueueType) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
      .join("templates")
      .join(format!("{}_template.txt", queue_type))
  }

  pub fn queue_type(&self) -> QueueType {
    self.queue_type
  }

  pub fn queue_name(&self) -> &str {
    &self.queue_name
  }

  pub fn template_file(&self) -> &Path {
    &self.template_file
  }

  pub fn submit_program(&self) -> &'static str {
    self.queue_type.submit_program()
  }

  pub fn options(&self) -> &ConfigMap {
    &self.options
  }

  pub fn get_option(&self, key: &str) -> Option<&Value> {
    self.options.get(key)
  }

  /// The `queue` option as text, if one is configured.
  pub fn queue_filter(&self) -> Option<String> {
    match self.options.get("queue")? {
      Value::Null => None,
      Value::String(queue) => Some(queue.clone()),
      other => Some(other.to_string()),
    }
  }

  pub fn logger_name(&self) -> String {
    format!("qadapter.{}", self.queue_name)
  }

  pub fn submit_command(&self, script_file: &Path) -> Vec<String> {
    self.queue_type.submit_command(script_file)
  }

  pub fn status_command(&self, username: &str) -> Vec<String> {
    self.queue_type.status_command(username)
  }

  pub fn submit_to_queue(&self, script_file: &Path) -> Result<Option<JobId>, AdapterError> {
    self.submit_to_queue_with(script_file, &SystemCommandRunner, &LogQueueLogger)
  }

  /// Hands `script_file` to `sbatch`/`qsub` and returns the parsed job id.
  ///
  /// Only a missing script is an error. A rejected submission, an
  /// unparsable answer or a submit tool that cannot be started are logged
  /// and give `Ok(None)`.
  pub fn submit_to_queue_with(
    &self,
    script_file: &Path,
    runner: &dyn CommandRunner,
    logger: &dyn QueueLogger,
  ) -> Result<Option<JobId>, AdapterError> {
    if !script_file.exists() {
      return Err(AdapterError::ScriptNotFound(script_file.to_path_buf()));
    }

    let logger_name = self.logger_name();
    let cmd = self.submit_command(script_file);

    let output = match runner.run(&cmd, None) {
      Ok(output) => output,
      Err(err) => {
        logger.exception(
          &logger_name,
          &format!("Running the command: {} caused an error...", self.submit_program()),
          &err,
        );
        return Ok(None);
      }
    };

    if !output.success() {
      logger.error(
        &logger_name,
        &[
          format!(
            "Error in job submission with {} file {} and cmd {:?}",
            self.queue_name,
            script_file.display(),
            cmd
          ),
          format!("The error response reads: {}", output.stderr),
        ],
      );
      return Ok(None);
    }

    match self.queue_type.parse_job_id(&output.stdout) {
      Ok(job_id) => {
        logger.info(
          &logger_name,
          &format!("Job submission was successful and job_id is {}", job_id),
        );
        Ok(Some(job_id))
      }
      Err(err) => {
        logger.exception(
          &logger_name,
          &format!("Could not parse job id following {}...", self.submit_program()),
          &err,
        );
        Ok(None)
      }
    }
  }

  pub fn get_njobs_in_queue(&self, username: Option<&str>) -> Option<usize> {
    self.get_njobs_in_queue_with(username, &SystemCommandRunner, &LogQueueLogger)
  }

  /// Number of the user's active jobs, `None` when it cannot be known.
  ///
  /// The status tool gets [`STATUS_TIMEOUT`] to answer. A timeout, a
  /// nonzero exit or an unreadable table all give `None`, never zero.
  pub fn get_njobs_in_queue_with(
    &self,
    username: Option<&str>,
    runner: &dyn CommandRunner,
    logger: &dyn QueueLogger,
  ) -> Option<usize> {
    let logger_name = self.logger_name();

    let username = match username {
      Some(name) => name.to_string(),
      None => match current_username() {
        Ok(name) => name,
        Err(err) => {
          logger.exception(
            &logger_name,
            "Error trying to get the number of jobs in the queue: unknown current user",
            &err,
          );
          return None;
        }
      },
    };

    let cmd = self.status_command(&username);
    let output = match runner.run(&cmd, Some(STATUS_TIMEOUT)) {
      Ok(output) => output,
      Err(err @ CommandError::Timeout { .. }) => {
        logger.error(
          &logger_name,
          &[
            "Error trying to get the number of jobs in the queue".to_string(),
            err.to_string(),
          ],
        );
        return None;
      }
      Err(err) => {
        logger.exception(
          &logger_name,
          &format!("Running the command: {} caused an error...", cmd[0]),
          &err,
        );
        return None;
      }
    };

    if !output.success() {
      logger.error(
        &logger_name,
        &[
          "Error trying to get the number of jobs in the queue".to_string(),
          format!("The error response reads: {}", output.stderr),
        ],
      );
      return None;
    }

    let queue_filter = self.queue_filter();
    match self
      .queue_type
      .parse_njobs(&output.stdout, &username, queue_filter.as_deref())
    {
      Ok(njobs) => {
        logger.info(
          &logger_name,
          &format!("The number of jobs currently in the queue is: {}", njobs),
        );
        Some(njobs)
      }
      Err(err) => {
        logger.exception(
          &logger_name,
          &format!("Could not parse the output of {}...", cmd[0]),
          &err,
        );
        None
      }
    }
  }

  /// Options plus the reserved `_fw_` keys. Queue name and template file
  /// are only written when they differ from their defaults.
  pub fn to_config(&self) -> ConfigMap {
    let mut config = self.options.clone();
    config.insert(KIND_KEY.to_string(), Value::from(ADAPTER_KIND));
    config.insert(QUEUE_TYPE_KEY.to_string(), Value::from(self.queue_type.as_str()));
    if self.queue_name != self.queue_type.as_str() {
      config.insert(QUEUE_NAME_KEY.to_string(), Value::from(self.queue_name.clone()));
    }
    if self.template_file != Self::default_template_file(self.queue_type) {
      config.insert(
        TEMPLATE_FILE_KEY.to_string(),
        Value::from(self.template_file.to_string_lossy().into_owned()),
      );
    }
    config
  }

  /// Inverse of [`QueueAdapter::to_config`]. Keys without the reserved
  /// prefix become options.
  pub fn from_config(config: &ConfigMap) -> Result<Self, AdapterError> {
    if let Some(kind) = optional_str(config, KIND_KEY)? {
      if kind != ADAPTER_KIND {
        return Err(AdapterError::UnknownAdapterKind(kind.to_string()));
      }
    }
    let queue_type = optional_str(config, QUEUE_TYPE_KEY)?
      .ok_or_else(|| AdapterError::MissingKey(QUEUE_TYPE_KEY.to_string()))?;
    let queue_name = optional_str(config, QUEUE_NAME_KEY)?;
    let template_file = optional_str(config, TEMPLATE_FILE_KEY)?.map(Path::new);

    let options: ConfigMap = config
      .iter()
      .filter(|(k, _)| !k.starts_with(RESERVED_PREFIX))
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect();

    Self::create(queue_type, queue_name, template_file, options)
  }
}

fn optional_str<'a>(config: &'a ConfigMap, key: &str) -> Result<Option<&'a str>, AdapterError> {
  match config.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(_) => Err(AdapterError::WrongType(key.to_string(), "string".to_string())),
  }
}

/// Name of the process's effective user, looked up from its uid rather than
/// from the login environment variables.
pub fn current_username() -> std::io::Result<String> {
  whoami::username().map_err(std::io::Error::from)
}
