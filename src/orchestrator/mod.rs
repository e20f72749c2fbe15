//! Build-and-run orchestration for one generated program
//!
//! Each attempt walks `Prepared -> Compiled -> run`: the source is written
//! into a fresh scratch directory, compiled if the language needs it, then
//! executed under a wall-clock limit. The scratch directory is released on
//! every path out.

pub mod scratch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::compiler;
use crate::error::{ExecutionError, GradeError};
use crate::harness::GeneratedProgram;
use crate::languages::{LanguageConfig, LanguageTable};
use crate::runner::{CommandSpec, RunLimits, RunStatus, Runner};

pub use scratch::ScratchArtifact;

/// Prefix of every scratch identity
pub const PROGRAM_PREFIX: &str = "Solution";

/// Time and output budgets applied to every attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionLimits {
    pub run_time_limit_ms: u64,
    pub compile_time_limit_ms: u64,
    pub max_output_bytes: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            run_time_limit_ms: 10_000,
            compile_time_limit_ms: 30_000,
            max_output_bytes: 1 << 20,
        }
    }
}

/// Output of a run that exited cleanly
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub time_ms: u64,
}

pub struct Orchestrator {
    languages: Arc<LanguageTable>,
    runner: Arc<dyn Runner>,
    scratch_root: PathBuf,
    limits: ExecutionLimits,
}

/// Source written, nothing built yet
struct Prepared<'a> {
    artifact: &'a ScratchArtifact,
    config: &'a LanguageConfig,
}

/// Ready to run
struct Compiled<'a> {
    artifact: &'a ScratchArtifact,
    config: &'a LanguageConfig,
}

impl Orchestrator {
    /// Create an orchestrator, creating `scratch_root` if it does not exist
    pub fn new(
        languages: Arc<LanguageTable>,
        runner: Arc<dyn Runner>,
        scratch_root: impl Into<PathBuf>,
        limits: ExecutionLimits,
    ) -> Result<Self, GradeError> {
        let scratch_root = scratch_root.into();
        std::fs::create_dir_all(&scratch_root).map_err(|source| GradeError::ScratchRoot {
            path: scratch_root.clone(),
            source,
        })?;

        info!("Scratch root: {:?}", scratch_root);

        Ok(Self {
            languages,
            runner,
            scratch_root,
            limits,
        })
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Reserve the scratch identity for one attempt. The program must be
    /// generated after this, since Java names its class after the identity.
    pub fn reserve(&self, config: &LanguageConfig) -> Result<ScratchArtifact, ExecutionError> {
        ScratchArtifact::create(&self.scratch_root, PROGRAM_PREFIX, &config.extension).map_err(
            |e| {
                ExecutionError::Scratch(format!(
                    "Failed to create scratch directory in {:?}: {}",
                    self.scratch_root, e
                ))
            },
        )
    }

    /// Write, build and run `program` inside `artifact`, then release it
    pub async fn execute(
        &self,
        artifact: ScratchArtifact,
        config: &LanguageConfig,
        program: &GeneratedProgram,
    ) -> Result<RawOutput, ExecutionError> {
        let result = self.build_and_run(&artifact, config, program).await;
        artifact.release();
        result
    }

    async fn build_and_run(
        &self,
        artifact: &ScratchArtifact,
        config: &LanguageConfig,
        program: &GeneratedProgram,
    ) -> Result<RawOutput, ExecutionError> {
        let prepared = self.prepare(artifact, config, program).await?;
        let compiled = self.compile(prepared).await?;
        self.run(compiled).await
    }

    async fn prepare<'a>(
        &self,
        artifact: &'a ScratchArtifact,
        config: &'a LanguageConfig,
        program: &GeneratedProgram,
    ) -> Result<Prepared<'a>, ExecutionError> {
        tokio::fs::write(artifact.source_path(), &program.text)
            .await
            .map_err(|e| {
                ExecutionError::Scratch(format!(
                    "Failed to write {:?}: {}",
                    artifact.source_path(),
                    e
                ))
            })?;

        debug!(
            "Prepared {} program {}",
            program.language,
            artifact.program_name()
        );
        Ok(Prepared { artifact, config })
    }

    async fn compile<'a>(&self, prepared: Prepared<'a>) -> Result<Compiled<'a>, ExecutionError> {
        let Prepared { artifact, config } = prepared;

        if let Some(cmd) = config.compile_command_for(&artifact.command_vars()) {
            let cmd = CommandSpec::from_vec(&cmd).with_work_dir(artifact.dir());
            let limits = RunLimits::new(
                self.limits.compile_time_limit_ms,
                self.limits.max_output_bytes,
            );

            let result = compiler::compile(self.runner.as_ref(), &cmd, &limits)
                .await
                .map_err(|e| ExecutionError::Compile(format!("{:#}", e)))?;

            if !result.success {
                let message = result
                    .message
                    .unwrap_or_else(|| "Compilation failed".to_string());
                debug!("Compilation of {} failed", artifact.program_name());
                return Err(ExecutionError::Compile(scrub(&message, artifact)));
            }
        }

        Ok(Compiled { artifact, config })
    }

    async fn run(&self, compiled: Compiled<'_>) -> Result<RawOutput, ExecutionError> {
        let Compiled { artifact, config } = compiled;

        let cmd = CommandSpec::from_vec(&config.run_command_for(&artifact.command_vars()))
            .with_work_dir(artifact.dir());
        let limits = RunLimits::new(self.limits.run_time_limit_ms, self.limits.max_output_bytes);

        let outcome = self
            .runner
            .run(&cmd, &limits)
            .await
            .map_err(|e| ExecutionError::Runtime(format!("{:#}", e)))?;

        debug!(
            "{} finished with {:?} in {}ms",
            artifact.program_name(),
            outcome.status,
            outcome.time_ms
        );

        match outcome.status {
            RunStatus::Exited(0) => Ok(RawOutput {
                stdout: outcome.stdout,
                stderr: outcome.stderr,
                time_ms: outcome.time_ms,
            }),
            RunStatus::TimedOut => Err(ExecutionError::Timeout(limits.time_ms)),
            RunStatus::Exited(_) => Err(ExecutionError::Runtime(diagnostic(
                &scrub(&outcome.stderr, artifact),
                "Process exited with non-zero code".to_string(),
            ))),
            RunStatus::Signaled(signal) => Err(ExecutionError::Runtime(diagnostic(
                &scrub(&outcome.stderr, artifact),
                format!("Process terminated by signal {}", signal),
            ))),
        }
    }
}

/// Strip the per-attempt directory and identity from a diagnostic, so the
/// same mistake reads the same on every test case.
fn scrub(message: &str, artifact: &ScratchArtifact) -> String {
    let dir = format!("{}/", artifact.dir().to_string_lossy());
    message
        .replace(&dir, "")
        .replace(artifact.program_name(), PROGRAM_PREFIX)
}

fn diagnostic(stderr: &str, fallback: String) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed.to_string()
    }
}
