//! Host process runner
//!
//! Each command runs in its own process group so that a timeout (or a
//! program that leaves background children behind) can be cleaned up with a
//! single `killpg`. stdout and stderr are read concurrently and capped.
//! A descendant that escaped the group into its own session may still hold
//! the pipes; the readers get `DRAIN_GRACE` after the process ends and then
//! stop with whatever they have.

use anyhow::{Context, Result};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};

/// How long the readers may keep draining once the process is gone
const DRAIN_GRACE: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 8192;

/// Runner that executes commands directly on the host
#[derive(Debug, Default, Clone)]
pub struct HostRunner;

impl HostRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for HostRunner {
    async fn run(&self, cmd: &CommandSpec, limits: &RunLimits) -> Result<RunOutcome> {
        debug!("Running {:?} with args: {:?}", cmd.program, cmd.args);

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);
        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }

        let started = Instant::now();
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", cmd.program))?;
        let pgid = child.id().map(|id| Pid::from_raw(id as i32));

        let stdout = child.stdout.take().context("stdout was not piped")?;
        let stderr = child.stderr.take().context("stderr was not piped")?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let stdout_task = tokio::spawn(read_capped(
            stdout,
            limits.max_output_bytes,
            stop_rx.clone(),
        ));
        let stderr_task = tokio::spawn(read_capped(stderr, limits.max_output_bytes, stop_rx));

        let waited =
            tokio::time::timeout(Duration::from_millis(limits.time_ms), child.wait()).await;

        // Leftover grandchildren would otherwise hold the pipes open
        if let Some(pgid) = pgid {
            kill_group(pgid);
        }

        let status = match waited {
            Ok(status) => {
                let status = status.context("Failed to wait for process")?;
                match (status.code(), status.signal()) {
                    (Some(code), _) => RunStatus::Exited(code),
                    (None, Some(signal)) => RunStatus::Signaled(signal),
                    (None, None) => RunStatus::Exited(-1),
                }
            }
            Err(_) => {
                debug!("{} exceeded {}ms, killed", cmd.program, limits.time_ms);
                child.wait().await.context("Failed to reap timed out process")?;
                RunStatus::TimedOut
            }
        };
        let time_ms = started.elapsed().as_millis() as u64;

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(DRAIN_GRACE).await;
            let _ = stop_tx.send(true);
        });
        let stdout = stdout_task.await.context("stdout reader panicked")?;
        let stderr = stderr_task.await.context("stderr reader panicked")?;
        stopper.abort();

        Ok(RunOutcome {
            status,
            time_ms,
            stdout,
            stderr,
        })
    }
}

fn kill_group(pgid: Pid) {
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill process group {}: {}", pgid, e),
    }
}

/// Keep the first `limit` bytes of a stream and discard the rest, so a
/// chatty program can neither block on a full pipe nor exhaust memory.
/// Returns early with the bytes kept so far once `stop` flips.
async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    limit: usize,
    mut stop: watch::Receiver<bool>,
) -> String {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        tokio::select! {
            read = reader.read(&mut chunk) => match read {
                Ok(0) => break,
                Ok(n) => {
                    let room = limit.saturating_sub(buf.len());
                    buf.extend_from_slice(&chunk[..n.min(room)]);
                }
                Err(e) => {
                    debug!("Output stream closed with error: {}", e);
                    break;
                }
            },
            _ = stop.changed() => {
                debug!("Output stream still open after the process ended, giving up");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").with_args(["-c", script])
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let outcome = HostRunner::new()
            .run(&sh("echo hello; echo oops >&2; exit 3"), &RunLimits::new(5_000, 1024))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Exited(3));
        assert_eq!(outcome.stdout, "hello\n");
        assert_eq!(outcome.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        let started = Instant::now();
        let outcome = HostRunner::new()
            .run(&sh("sleep 30 & sleep 30"), &RunLimits::new(300, 1024))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_timeout_ignores_detached_session() {
        let started = Instant::now();
        let outcome = HostRunner::new()
            .run(&sh("setsid sleep 6 & sleep 30"), &RunLimits::new(300, 1024))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_detached_session_keeps_output_read_so_far() {
        let started = Instant::now();
        let outcome = HostRunner::new()
            .run(&sh("setsid sleep 6 & echo done"), &RunLimits::new(5_000, 1024))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Exited(0));
        assert_eq!(outcome.stdout, "done\n");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_output_is_capped() {
        let outcome = HostRunner::new()
            .run(&sh("yes | head -c 100000"), &RunLimits::new(5_000, 16))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.stdout.len(), 16);
    }

    #[tokio::test]
    async fn test_signal_is_reported() {
        let outcome = HostRunner::new()
            .run(&sh("kill -9 $$"), &RunLimits::new(5_000, 1024))
            .await
            .unwrap();
        assert_eq!(outcome.status, RunStatus::Signaled(9));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_error() {
        let result = HostRunner::new()
            .run(
                &CommandSpec::new("/nonexistent/grader-test-binary"),
                &RunLimits::new(1_000, 1024),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_work_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = HostRunner::new()
            .run(&sh("pwd").with_work_dir(dir.path()), &RunLimits::new(5_000, 4096))
            .await
            .unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(outcome.stdout.trim(), expected.to_string_lossy());
    }
}
