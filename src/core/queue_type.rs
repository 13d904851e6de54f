#[cfg(test)]
mod tests;

use std::path::Path;

use strum::{Display, EnumString, VariantNames};

use crate::core::parsers::{self, HeaderLayout, JobId, JobIdParseError, NjobsParseError};

/// Batch queue systems reachable through their command-line tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, VariantNames)]
pub enum QueueType {
  #[strum(serialize = "PBS")]
  Pbs,
  #[strum(serialize = "SGE")]
  Sge,
  #[strum(serialize = "SLURM")]
  Slurm,
}

impl QueueType {
  pub fn supported() -> &'static [&'static str] {
    Self::VARIANTS
  }

  /// Name used in configurations and template file names.
  pub fn as_str(&self) -> &'static str {
    match self {
      QueueType::Pbs => "PBS",
      QueueType::Sge => "SGE",
      QueueType::Slurm => "SLURM",
    }
  }

  pub fn submit_program(&self) -> &'static str {
    match self {
      QueueType::Slurm => "sbatch",
      QueueType::Pbs | QueueType::Sge => "qsub",
    }
  }

  pub fn submit_command(&self, script_file: &Path) -> Vec<String> {
    vec![
      self.submit_program().to_string(),
      script_file.to_string_lossy().into_owned(),
    ]
  }

  pub fn status_command(&self, username: &str) -> Vec<String> {
    match self {
      // squeue receives the format flag and its quoted value as one argument
      QueueType::Slurm => vec![
        "squeue".to_string(),
        "-o \"%u\"".to_string(),
        "-u".to_string(),
        username.to_string(),
      ],
      QueueType::Pbs | QueueType::Sge => {
        vec!["qstat".to_string(), "-u".to_string(), username.to_string()]
      }
    }
  }

  pub fn parse_job_id(&self, output: &str) -> Result<JobId, JobIdParseError> {
    match self {
      QueueType::Slurm => parsers::parse_slurm_job_id(output),
      QueueType::Pbs | QueueType::Sge => parsers::parse_first_digit_run(output),
    }
  }

  pub fn parse_njobs(
    &self,
    output: &str,
    username: &str,
    queue_filter: Option<&str>,
  ) -> Result<usize, NjobsParseError> {
    match self {
      QueueType::Slurm => Ok(parsers::count_slurm_jobs(output, username)),
      QueueType::Pbs => parsers::count_table_jobs(output, username, queue_filter, HeaderLayout::Pbs),
      QueueType::Sge => parsers::count_table_jobs(output, username, queue_filter, HeaderLayout::Sge),
    }
  }
}
