use std::io::{self, Read};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::core::command::{
  CommandError, CommandOutput, CommandRunner, Stream, SystemCommandRunner, collect_output, drain,
};

struct BrokenPipe;

impl Read for BrokenPipe {
  fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
    Err(io::Error::new(io::ErrorKind::BrokenPipe, "read failed"))
  }
}

fn argv(parts: &[&str]) -> Vec<String> {
  parts.iter().map(|p| p.to_string()).collect()
}

#[test]
fn test_run_captures_output_and_exit_code() {
  let output = SystemCommandRunner
    .run(&argv(&["sh", "-c", "echo out; echo err >&2; exit 3"]), None)
    .unwrap();
  assert_eq!(output.exit_code, Some(3));
  assert_eq!(output.stdout, "out\n");
  assert_eq!(output.stderr, "err\n");
  assert!(!output.success());
}

#[test]
fn test_run_with_timeout_finishes_in_time() {
  let output = SystemCommandRunner
    .run(&argv(&["sh", "-c", "echo done"]), Some(Duration::from_secs(5)))
    .unwrap();
  assert!(output.success());
  assert_eq!(output.stdout, "done\n");
}

#[test]
fn test_run_timeout_kills_process() {
  let start = Instant::now();
  let result = SystemCommandRunner.run(&argv(&["sleep", "10"]), Some(Duration::from_millis(200)));
  assert!(matches!(result, Err(CommandError::Timeout { .. })));
  assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_run_missing_binary() {
  let result = SystemCommandRunner.run(&argv(&["qadapter-no-such-binary"]), None);
  assert!(matches!(result, Err(CommandError::SpawnError { .. })));
}

#[test]
fn test_run_empty_command() {
  let result = SystemCommandRunner.run(&[], None);
  assert!(matches!(result, Err(CommandError::EmptyCommand)));
}

#[test]
fn test_success_requires_zero_exit() {
  let mut output = CommandOutput::default();
  assert!(!output.success());
  output.exit_code = Some(0);
  assert!(output.success());
}

#[test]
fn test_timeout_covers_background_process_holding_pipe() {
  let start = Instant::now();
  let result = SystemCommandRunner.run(
    &argv(&["sh", "-c", "sleep 3 & echo listed"]),
    Some(Duration::from_secs(1)),
  );
  assert!(matches!(result, Err(CommandError::Timeout { .. })));
  assert!(start.elapsed() < Duration::from_millis(2500));
}

#[test]
fn test_collect_output_reports_read_failure() {
  let (sender, receiver) = mpsc::channel();
  drain(&b"partial"[..], Stream::Stdout, sender.clone());
  drain(BrokenPipe, Stream::Stderr, sender);

  let deadline = Instant::now() + Duration::from_secs(5);
  let result = collect_output(
    Some(0),
    &receiver,
    2,
    deadline,
    Duration::from_secs(5),
    "qstat -u alice".to_string(),
  );
  match result {
    Err(CommandError::WaitError { command, source }) => {
      assert_eq!(command, "qstat -u alice");
      assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
    }
    other => panic!("Unexpected result {:?}", other),
  }
}

#[test]
fn test_collect_output_assigns_streams() {
  let (sender, receiver) = mpsc::channel();
  drain(&b"out"[..], Stream::Stdout, sender.clone());
  drain(&b"err"[..], Stream::Stderr, sender);

  let output = collect_output(
    Some(1),
    &receiver,
    2,
    Instant::now() + Duration::from_secs(5),
    Duration::from_secs(5),
    "qsub job.sh".to_string(),
  )
  .unwrap();
  assert_eq!(output.exit_code, Some(1));
  assert_eq!(output.stdout, "out");
  assert_eq!(output.stderr, "err");
}
