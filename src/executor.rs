// ABOUTME: Command executor — runs a command through the shell and streams its output line by line.
// ABOUTME: stdout and stderr share one OS pipe feeding a bounded channel; the exit code follows the last line.

use std::io::{BufRead, BufReader, Read};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::config::{ExecutorConfig, ShellConfig};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Spawns shell commands. Holds no per-command state, so one instance is shared.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    shell: ShellConfig,
    output_buffer: usize,
}

impl CommandExecutor {
    pub fn new(shell: ShellConfig, executor: &ExecutorConfig) -> Self {
        Self {
            shell,
            output_buffer: executor.output_buffer.max(1),
        }
    }

    /// Start `command` under the configured shell.
    ///
    /// The child inherits the gateway's environment and working directory.
    /// Its stdin is the null device so it can never read protocol input.
    /// stdout and stderr share one pipe, so lines arrive in the order written.
    pub fn spawn(&self, command: &str) -> Result<RunningCommand, ExecError> {
        let (reader, writer) = std::io::pipe().map_err(ExecError::Spawn)?;
        let stdout_writer = writer.try_clone().map_err(ExecError::Spawn)?;

        let mut cmd = Command::new(&self.shell.program);
        cmd.arg(&self.shell.flag)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_writer))
            .stderr(Stdio::from(writer));
        let child = cmd.spawn().map_err(ExecError::Spawn)?;
        // The command still owns the parent's write ends; EOF needs them closed.
        drop(cmd);

        let (tx, rx) = mpsc::channel(self.output_buffer);
        tokio::task::spawn_blocking(move || forward_lines(reader, tx));

        Ok(RunningCommand { child, output: rx })
    }
}

/// A spawned command whose output has not been fully consumed yet.
pub struct RunningCommand {
    child: Child,
    output: mpsc::Receiver<String>,
}

impl RunningCommand {
    /// Next line of combined output, including its newline.
    /// Returns `None` once every writer of the output pipe has closed it.
    pub async fn next_chunk(&mut self) -> Option<String> {
        self.output.recv().await
    }

    /// Wait for the process to exit and return its exit code.
    pub async fn wait(mut self) -> Result<i32, ExecError> {
        let status = self.child.wait().await.map_err(ExecError::Wait)?;
        Ok(exit_code(status))
    }
}

/// Forward newline-terminated chunks from the merged pipe until EOF or the receiver goes away.
///
/// Runs on the blocking pool; `blocking_send` parks it while the channel is full.
fn forward_lines<R: Read>(stream: R, tx: mpsc::Sender<String>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let chunk = String::from_utf8_lossy(&buf).into_owned();
                if tx.blocking_send(chunk).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "command output stream failed");
                break;
            }
        }
    }
}

/// Exit code as reported to callers: the code itself, `-signal` when killed
/// by a signal on Unix, otherwise -1.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
