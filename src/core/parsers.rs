
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit run regex is valid"));

/// Identifier handed back by the queue system after a submission.
///
/// SLURM ids are numeric, PBS and SGE ids are kept as the text that was
/// matched. Treat it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
  Numeric(u64),
  Text(String),
}

impl fmt::Display for JobId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      JobId::Numeric(id) => write!(f, "{}", id),
      JobId::Text(id) => f.write_str(id),
    }
  }
}

#[derive(Error, Debug, PartialEq)]
pub enum JobIdParseError {
  #[error("Expected at least 4 tokens in submission output, got {0:?}")]
  MissingToken(String),
  #[error("Job id token \"{0}\" is not an integer")]
  NotAnInteger(String),
  #[error("Unable to parse jobid from {0:?}")]
  NoDigits(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum NjobsParseError {
  #[error("Column \"{column}\" not found in status header \"{header}\"")]
  MissingHeaderColumn { column: &'static str, header: String },
}

/// Where the state and queue columns live in a `qstat` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
  /// PBS prints a two-token "Job ID" column, shifting every later header
  /// token one position to the right of its data column.
  Pbs,
  Sge,
}

impl HeaderLayout {
  fn state_and_queue_indices(&self, header: &str) -> Result<(usize, usize), NjobsParseError> {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    let (state_name, queue_name) = match self {
      HeaderLayout::Pbs => ("S", "Queue"),
      HeaderLayout::Sge => ("state", "queue"),
    };
    let find = |column: &'static str| {
      tokens
        .iter()
        .position(|t| *t == column)
        .ok_or_else(|| NjobsParseError::MissingHeaderColumn {
          column,
          header: header.to_string(),
        })
    };
    let state = find(state_name)?;
    let queue = find(queue_name)?;
    Ok(match self {
      HeaderLayout::Pbs => (state.saturating_sub(1), queue.saturating_sub(1)),
      HeaderLayout::Sge => (state, queue),
    })
  }
}

/// `sbatch` answers "Submitted batch job <id>", the id is the 4th token.
pub fn parse_slurm_job_id(output: &str) -> Result<JobId, JobIdParseError> {
  let token = output
    .split_whitespace()
    .nth(3)
    .ok_or_else(|| JobIdParseError::MissingToken(output.to_string()))?;
  token
    .parse::<u64>()
    .map(JobId::Numeric)
    .map_err(|_| JobIdParseError::NotAnInteger(token.to_string()))
}

/// First run of digits, e.g. "1234" out of "1234.servername".
pub fn parse_first_digit_run(output: &str) -> Result<JobId, JobIdParseError> {
  DIGIT_RUN
    .find(output)
    .map(|m| JobId::Text(m.as_str().to_string()))
    .ok_or_else(|| JobIdParseError::NoDigits(output.to_string()))
}

/// Counts `squeue` lines mentioning the user. Queue and state are not
/// filtered.
pub fn count_slurm_jobs(output: &str, username: &str) -> usize {
  output.lines().filter(|line| line.contains(username)).count()
}

/// Counts the user's non-completed jobs in a `qstat -u` table.
///
/// Every line starting with "job" (any case) is taken as a header and sets
/// the column layout for the lines after it. Lines mentioning the user
/// before any header, or too short to hold the columns, are ignored.
pub fn count_table_jobs(
  output: &str,
  username: &str,
  queue_filter: Option<&str>,
  layout: HeaderLayout,
) -> Result<usize, NjobsParseError> {
  let mut indices: Option<(usize, usize)> = None;
  let mut count = 0;

  for line in output.lines() {
    if line.to_lowercase().starts_with("job") {
      indices = Some(layout.state_and_queue_indices(line)?);
      continue;
    }
    if !line.contains(username) {
      continue;
    }
    let Some((state_index, queue_index)) = indices else {
      continue;
    };
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (Some(state), Some(queue)) = (tokens.get(state_index), tokens.get(queue_index)) else {
      continue;
    };
    if *state == "C" {
      continue;
    }
    if let Some(wanted) = queue_filter {
      if !queue_matches(wanted, queue) {
        continue;
      }
    }
    count += 1;
  }

  Ok(count)
}

/// Long queue names get cut by `qstat`, so only the visible part of the
/// configured name is compared.
pub fn queue_matches(configured: &str, observed: &str) -> bool {
  let visible: String = configured.chars().take(observed.chars().count()).collect();
  observed.starts_with(&visible)
}
