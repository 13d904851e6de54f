use std::path::Path;
use std::str::FromStr;

use crate::core::parsers::JobId;
use crate::core::queue_type::QueueType;

#[test]
fn test_parse_supported_names() {
  assert_eq!(QueueType::from_str("PBS").unwrap(), QueueType::Pbs);
  assert_eq!(QueueType::from_str("SGE").unwrap(), QueueType::Sge);
  assert_eq!(QueueType::from_str("SLURM").unwrap(), QueueType::Slurm);
  assert_eq!(QueueType::supported(), &["PBS", "SGE", "SLURM"]);
}

#[test]
fn test_parse_unsupported_names() {
  assert!(QueueType::from_str("LSF").is_err());
  assert!(QueueType::from_str("slurm").is_err());
  assert!(QueueType::from_str("").is_err());
}

#[test]
fn test_display_matches_config_name() {
  assert_eq!(QueueType::Slurm.to_string(), "SLURM");
  assert_eq!(QueueType::Pbs.as_str(), "PBS");
}

#[test]
fn test_submit_command() {
  let script = Path::new("/tmp/job.sh");
  assert_eq!(QueueType::Slurm.submit_command(script), vec!["sbatch", "/tmp/job.sh"]);
  assert_eq!(QueueType::Pbs.submit_command(script), vec!["qsub", "/tmp/job.sh"]);
  assert_eq!(QueueType::Sge.submit_command(script), vec!["qsub", "/tmp/job.sh"]);
}

#[test]
fn test_status_command() {
  assert_eq!(
    QueueType::Slurm.status_command("alice"),
    vec!["squeue", "-o \"%u\"", "-u", "alice"]
  );
  assert_eq!(QueueType::Pbs.status_command("alice"), vec!["qstat", "-u", "alice"]);
  assert_eq!(QueueType::Sge.status_command("alice"), vec!["qstat", "-u", "alice"]);
}

#[test]
fn test_job_id_type_depends_on_queue() {
  assert_eq!(
    QueueType::Slurm.parse_job_id("Submitted batch job 123456").unwrap(),
    JobId::Numeric(123456)
  );
  assert_eq!(
    QueueType::Pbs.parse_job_id("1234.servername").unwrap(),
    JobId::Text("1234".to_string())
  );
  assert!(QueueType::Slurm.parse_job_id("1234.servername").is_err());
}

#[test]
fn test_slurm_njobs_ignores_queue_filter() {
  let output = "\"USER\"\n\"alice\"\n";
  assert_eq!(QueueType::Slurm.parse_njobs(output, "alice", Some("nothing")).unwrap(), 1);
}
