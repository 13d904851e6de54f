#[cfg(test)]
mod tests;

use std::io::{self, Read};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Error, Debug)]
pub enum CommandError {
  #[error("Empty command")]
  EmptyCommand,
  #[error("Failed to spawn `{command}`")]
  SpawnError {
    command: String,
    source: io::Error,
  },
  #[error("Failed to wait for `{command}`")]
  WaitError {
    command: String,
    source: io::Error,
  },
  #[error("`{command}` timed out after {timeout:?}")]
  Timeout { command: String, timeout: Duration },
}

/// Captured result of a finished process. `exit_code` is `None` when the
/// process was terminated by a signal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
  pub exit_code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.exit_code == Some(0)
  }
}

impl From<Output> for CommandOutput {
  fn from(output: Output) -> Self {
    CommandOutput {
      exit_code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
  }
}

/// Runs an external program to completion.
///
/// With `timeout` set, a process still running at the deadline is killed
/// and [`CommandError::Timeout`] is returned instead of its output.
pub trait CommandRunner {
  fn run(&self, argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput, CommandError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
  fn run(&self, argv: &[String], timeout: Option<Duration>) -> Result<CommandOutput, CommandError> {
    let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;
    let command_line = argv.join(" ");
    debug!("Running `{}` (timeout: {:?})", command_line, timeout);

    let child = Command::new(program)
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| CommandError::SpawnError {
        command: command_line.clone(),
        source,
      })?;

    match timeout {
      None => child
        .wait_with_output()
        .map(CommandOutput::from)
        .map_err(|source| CommandError::WaitError {
          command: command_line,
          source,
        }),
      Some(limit) => wait_with_timeout(child, limit, command_line),
    }
  }
}

fn wait_with_timeout(
  mut child: Child,
  limit: Duration,
  command_line: String,
) -> Result<CommandOutput, CommandError> {
  let deadline = Instant::now() + limit;

  // Pipes are drained on their own threads so a chatty child never blocks
  // on a full pipe while we poll for its exit.
  let (sender, receiver) = mpsc::channel();
  let mut pending = 0;
  if let Some(stdout) = child.stdout.take() {
    drain(stdout, Stream::Stdout, sender.clone());
    pending += 1;
  }
  if let Some(stderr) = child.stderr.take() {
    drain(stderr, Stream::Stderr, sender.clone());
    pending += 1;
  }
  drop(sender);

  let status = loop {
    match child.try_wait() {
      Ok(Some(status)) => break status,
      Ok(None) if Instant::now() >= deadline => {
        let _ = child.kill();
        let _ = child.wait();
        return Err(CommandError::Timeout {
          command: command_line,
          timeout: limit,
        });
      }
      Ok(None) => thread::sleep(POLL_INTERVAL),
      Err(source) => {
        return Err(CommandError::WaitError {
          command: command_line,
          source,
        });
      }
    }
  };

  collect_output(status.code(), &receiver, pending, deadline, limit, command_line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
  Stdout,
  Stderr,
}

type Drained = (Stream, io::Result<Vec<u8>>);

fn drain<R: Read + Send + 'static>(mut source: R, stream: Stream, sender: Sender<Drained>) {
  thread::spawn(move || {
    let mut buffer = Vec::new();
    let result = source.read_to_end(&mut buffer).map(|_| buffer);
    let _ = sender.send((stream, result));
  });
}

/// Waits for `pending` drained pipes. Background processes started by the
/// child may keep a pipe open, so the wait is still bounded by `deadline`.
fn collect_output(
  exit_code: Option<i32>,
  receiver: &Receiver<Drained>,
  pending: usize,
  deadline: Instant,
  limit: Duration,
  command_line: String,
) -> Result<CommandOutput, CommandError> {
  let mut output = CommandOutput {
    exit_code,
    ..CommandOutput::default()
  };

  for _ in 0..pending {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match receiver.recv_timeout(remaining) {
      Ok((stream, Ok(bytes))) => {
        let text = String::from_utf8_lossy(&bytes).into_owned();
        match stream {
          Stream::Stdout => output.stdout = text,
          Stream::Stderr => output.stderr = text,
        }
      }
      Ok((_, Err(source))) => {
        return Err(CommandError::WaitError {
          command: command_line,
          source,
        });
      }
      Err(RecvTimeoutError::Timeout) => {
        return Err(CommandError::Timeout {
          command: command_line,
          timeout: limit,
        });
      }
      Err(RecvTimeoutError::Disconnected) => break,
    }
  }

  Ok(output)
}
