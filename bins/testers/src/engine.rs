/// Execution Engine - Local Process Runner
///
/// **Core Responsibility:**
/// Launch the target once per case, feed it the case input, and capture
/// its combined stdout+stderr under a hard wall-clock deadline.
///
/// **Boundary:**
/// - Engine knows HOW to execute (spawn, pipe, kill)
/// - Engine does NOT compare outputs or assign points
/// - Engine returns raw outputs for the evaluator to judge
///
/// stdout and stderr share a single OS pipe, so the captured bytes keep
/// the exact order in which the process wrote them.

use crate::evaluator::ExecutionOutput;
use std::io;
use std::os::fd::OwnedFd;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use testers_common::types::Case;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, warn};

/// Selector keyword that runs the program path directly
pub const COMPILER_MODE: &str = "compiler";

/// How long to keep reading after the target exits. Background children
/// that inherited the output pipe can hold it open past the exit.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(100);

const READ_CHUNK_BYTES: usize = 8192;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to start `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to set up output capture: {0}")]
    Pipe(#[source] io::Error),
}

/// What to launch for every case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub argument: Option<String>,
}

impl Invocation {
    /// Build an invocation from the CLI selector and program path.
    ///
    /// `compiler` runs `path` itself with no argument. Any other selector
    /// names an interpreter that receives `path` as its only argument.
    pub fn from_mode(selector: &str, path: &str) -> Self {
        if selector == COMPILER_MODE {
            Self {
                program: path.to_string(),
                argument: None,
            }
        } else {
            Self {
                program: selector.to_string(),
                argument: Some(path.to_string()),
            }
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.argument {
            Some(arg) => write!(f, "{} {}", self.program, arg),
            None => write!(f, "{}", self.program),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessEngine {
    drain_grace: Duration,
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self {
            drain_grace: OUTPUT_DRAIN_GRACE,
        }
    }
}

/// How the capture loop ended
enum Capture {
    Exited(ExitStatus),
    Broken(io::Error),
    DeadlineExceeded,
}

impl ProcessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one case under `timeout`.
    ///
    /// Only a failure to start the process is an `Err`. Timeouts and
    /// capture failures come back as flagged `ExecutionOutput`s.
    #[tracing::instrument(skip(self, case), fields(program = %invocation.program, timeout_secs = timeout.as_secs()))]
    pub async fn run(
        &self,
        invocation: &Invocation,
        case: &Case,
        timeout: Duration,
    ) -> Result<ExecutionOutput, SpawnError> {
        let (reader, writer) = io::pipe().map_err(SpawnError::Pipe)?;
        let stderr_writer = writer.try_clone().map_err(SpawnError::Pipe)?;
        let mut combined_rx =
            pipe::Receiver::from_owned_fd(OwnedFd::from(reader)).map_err(SpawnError::Pipe)?;

        let mut command = Command::new(&invocation.program);
        if let Some(arg) = &invocation.argument {
            command.arg(arg);
        }
        command
            .stdin(Stdio::piped())
            .stdout(writer)
            .stderr(stderr_writer)
            .kill_on_drop(true);

        let start_time = Instant::now();
        let spawned = command.spawn();
        // The command keeps the parent's write ends open; EOF needs them gone.
        drop(command);
        let mut child = spawned.map_err(|source| SpawnError::Launch {
            program: invocation.program.clone(),
            source,
        })?;

        if let Some(stdin) = child.stdin.take() {
            tokio::spawn(feed_stdin(stdin, case.input.clone()));
        }

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut combined = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK_BYTES];
        let mut eof = false;

        // Only the exit status races the deadline; output is read alongside
        let capture = loop {
            tokio::select! {
                waited = child.wait() => match waited {
                    Ok(status) => break Capture::Exited(status),
                    Err(e) => break Capture::Broken(e),
                },
                read = combined_rx.read(&mut chunk), if !eof => match read {
                    Ok(0) => eof = true,
                    Ok(n) => combined.extend_from_slice(&chunk[..n]),
                    Err(e) => break Capture::Broken(e),
                },
                _ = &mut deadline => break Capture::DeadlineExceeded,
            }
        };

        let output = match capture {
            Capture::Exited(status) => {
                if !eof {
                    let drained = tokio::time::timeout(
                        self.drain_grace,
                        drain(&mut combined_rx, &mut combined),
                    )
                    .await;
                    match drained {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => debug!(error = %e, "Output pipe failed after exit"),
                        Err(_) => debug!(
                            bytes = combined.len(),
                            "Output pipe still held open after exit; using what was read"
                        ),
                    }
                }
                debug!(
                    exit_code = ?status.code(),
                    bytes = combined.len(),
                    "Process exited"
                );
                ExecutionOutput {
                    combined,
                    exit_code: status.code(),
                    execution_ms: elapsed_ms(start_time),
                    timed_out: false,
                    capture_failed: false,
                }
            }
            Capture::Broken(e) => {
                warn!(error = %e, "Lost contact with process while capturing output");
                stop(&mut child).await;
                ExecutionOutput {
                    execution_ms: elapsed_ms(start_time),
                    capture_failed: true,
                    ..ExecutionOutput::default()
                }
            }
            Capture::DeadlineExceeded => {
                warn!(timeout_secs = timeout.as_secs(), "Deadline exceeded - killing process");
                stop(&mut child).await;
                // Partial output is discarded on timeout
                ExecutionOutput {
                    execution_ms: elapsed_ms(start_time),
                    timed_out: true,
                    ..ExecutionOutput::default()
                }
            }
        };

        Ok(output)
    }
}

/// Signal the child and reap it
async fn stop(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Process already gone");
    }
    if let Err(e) = child.wait().await {
        debug!(error = %e, "Failed to reap process");
    }
}

async fn drain(rx: &mut pipe::Receiver, sink: &mut Vec<u8>) -> io::Result<()> {
    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        let n = rx.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        sink.extend_from_slice(&chunk[..n]);
    }
}

/// Push the whole input, then close stdin by dropping the handle.
///
/// Write errors are not surfaced: a target that exits without reading
/// its input is judged on its output alone.
async fn feed_stdin(mut stdin: ChildStdin, input: String) {
    if let Err(e) = stdin.write_all(input.as_bytes()).await {
        debug!(error = %e, "Target stopped accepting input");
        return;
    }
    if let Err(e) = stdin.flush().await {
        debug!(error = %e, "Failed to flush input");
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
