//! Runner module - Execution abstraction layer
//!
//! `HostRunner` spawns compilers and candidate programs as host processes.
//! The trait seam lets the orchestrator be exercised without toolchains.
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Know about languages or harnesses

pub mod host;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use host::HostRunner;

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        Self {
            program,
            args: iter.cloned().collect(),
            work_dir: None,
        }
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.iter().cloned());
        v
    }
}

/// Resource limits for execution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunLimits {
    /// Wall-clock limit in milliseconds
    pub time_ms: u64,
    /// Bytes retained per output stream; the rest is drained and dropped
    pub max_output_bytes: usize,
}

impl RunLimits {
    pub fn new(time_ms: u64, max_output_bytes: usize) -> Self {
        Self {
            time_ms,
            max_output_bytes,
        }
    }
}

/// Execution status (raw, no verdict interpretation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Wall-clock limit exceeded; the process group was killed
    TimedOut,
    /// Killed by signal
    Signaled(i32),
}

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Wall-clock time in milliseconds
    pub time_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command to completion or until `limits.time_ms` elapses.
    /// `Err` means the process could not be started at all.
    async fn run(&self, cmd: &CommandSpec, limits: &RunLimits) -> Result<RunOutcome>;
}
