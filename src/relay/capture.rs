//! Process output capture.
//!
//! Runs an external command with stdout and stderr piped, appends every
//! byte from either stream to one [`OutputLog`] as it arrives, and reports
//! the exit status on a separate one-shot channel.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

const READ_BUFFER_SIZE: usize = 10 * 1024;

/// Why a command did not finish successfully.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start command: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to wait for command: {0}")]
    Wait(#[source] io::Error),

    /// Process ran and exited unsuccessfully.
    #[error("{0}")]
    Exit(ExitStatus),

    #[error("command watcher stopped before reporting an exit status")]
    WaiterLost,
}

/// Terminal result of one command run.
pub type ProcessOutcome = Result<(), CommandError>;

/// Read side of the append-only output buffer.
///
/// Bytes are only ever appended, so any snapshot is a prefix of every later
/// snapshot.
#[derive(Clone, Default)]
pub struct OutputLog {
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl OutputLog {
    /// Copy of everything captured so far.
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single write side of an [`OutputLog`]. Not `Clone`: whoever owns it
/// is the only appender.
pub struct OutputWriter {
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl OutputWriter {
    pub fn append(&mut self, chunk: &[u8]) {
        self.bytes.write().extend_from_slice(chunk);
    }
}

/// Create a connected writer/log pair.
pub fn output_log() -> (OutputWriter, OutputLog) {
    let log = OutputLog::default();
    let writer = OutputWriter {
        bytes: Arc::clone(&log.bytes),
    };
    (writer, log)
}

/// A running (or failed-to-start) command.
pub struct Capture {
    pub log: OutputLog,
    /// Fires exactly once with the exit result.
    pub outcome: oneshot::Receiver<ProcessOutcome>,
    /// Fires when the reader stops: both streams hit EOF, or a read failed.
    pub drained: oneshot::Receiver<()>,
}

/// Start `command` and begin capturing its combined output.
///
/// A spawn failure is not returned as an error: the capture resolves
/// immediately with [`CommandError::Spawn`] and an empty log.
pub fn spawn_capture(mut command: Command) -> Capture {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let (writer, log) = output_log();
    let (outcome_tx, outcome) = oneshot::channel();
    let (drained_tx, drained) = oneshot::channel();

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(error = %e, "Failed to spawn command");
            let _ = outcome_tx.send(Err(CommandError::Spawn(e)));
            let _ = drained_tx.send(());
            return Capture {
                log,
                outcome,
                drained,
            };
        }
    };
    debug!(pid = ?child.id(), "Command started");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::spawn(async move {
        read_output(stdout, stderr, writer).await;
        let _ = drained_tx.send(());
    });

    tokio::spawn(async move {
        let outcome = match child.wait().await {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(CommandError::Exit(status)),
            Err(e) => Err(CommandError::Wait(e)),
        };
        debug!(success = outcome.is_ok(), "Command exited");
        if outcome_tx.send(outcome).is_err() {
            trace!("Command outcome dropped (relay gone)");
        }
    });

    Capture {
        log,
        outcome,
        drained,
    }
}

enum ReadStep {
    Data,
    Eof,
    Failed,
}

/// Reader loop: drain both pipes into `writer` until both reach EOF.
///
/// A read error other than EOF is logged and ends the loop; whatever was
/// captured so far stays in the log.
async fn read_output(
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
    mut writer: OutputWriter,
) {
    let mut out_buf = vec![0u8; READ_BUFFER_SIZE];
    let mut err_buf = vec![0u8; READ_BUFFER_SIZE];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            result = read_some(&mut stdout, &mut out_buf) => {
                match record(result, &out_buf, &mut writer, "stdout") {
                    ReadStep::Data => {}
                    ReadStep::Eof => stdout = None,
                    ReadStep::Failed => break,
                }
            }
            result = read_some(&mut stderr, &mut err_buf) => {
                match record(result, &err_buf, &mut writer, "stderr") {
                    ReadStep::Data => {}
                    ReadStep::Eof => stderr = None,
                    ReadStep::Failed => break,
                }
            }
        }
    }
}

async fn read_some<R: AsyncRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut [u8],
) -> io::Result<usize> {
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

fn record(
    result: io::Result<usize>,
    buf: &[u8],
    writer: &mut OutputWriter,
    stream: &'static str,
) -> ReadStep {
    match result {
        Ok(0) => {
            trace!(stream, "Output stream closed");
            ReadStep::Eof
        }
        Ok(n) => {
            writer.append(&buf[..n]);
            trace!(stream, bytes = n, "Captured output");
            ReadStep::Data
        }
        Err(e) if e.kind() == io::ErrorKind::Interrupted => ReadStep::Data,
        Err(e) => {
            warn!(stream, error = %e, "Reading command output failed");
            ReadStep::Failed
        }
    }
}
