//! Compiler module - Source code compilation
//!
//! Runs a language's compile command through a `Runner` and condenses the
//! outcome into a diagnostic the candidate can act on.

use anyhow::Result;
use tracing::debug;

use crate::runner::{CommandSpec, RunLimits, RunStatus, Runner};

/// Result of a compilation attempt
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    pub success: bool,
    pub message: Option<String>,
}

impl CompileResult {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

/// Compile with `cmd`. `Err` only when the compiler could not be started.
pub async fn compile(
    runner: &dyn Runner,
    cmd: &CommandSpec,
    limits: &RunLimits,
) -> Result<CompileResult> {
    if cmd.program.is_empty() {
        return Ok(CompileResult::ok());
    }

    debug!("Compiling with {:?}", cmd.to_vec());

    let result = runner.run(cmd, limits).await?;

    if result.is_success() {
        return Ok(CompileResult::ok());
    }

    let stderr = result.stderr.trim();
    let stdout = result.stdout.trim();
    let error_msg = if !stderr.is_empty() {
        stderr.to_string()
    } else if !stdout.is_empty() {
        stdout.to_string()
    } else {
        match result.status {
            RunStatus::TimedOut => "Compilation timed out".to_string(),
            RunStatus::Signaled(_) => "Compiler crashed".to_string(),
            RunStatus::Exited(code) => format!("Compilation failed with exit code {}", code),
        }
    };

    Ok(CompileResult {
        success: false,
        message: Some(error_msg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::{exited, timed_out, FakeRunner};

    fn gcc() -> CommandSpec {
        CommandSpec::new("gcc").with_args(["-o", "a", "a.c"])
    }

    #[tokio::test]
    async fn test_successful_compile() {
        let runner = FakeRunner::new(|_| Ok(exited(0, "", "warning: unused variable")));
        let result = compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .unwrap();
        assert_eq!(result, CompileResult::ok());
    }

    #[tokio::test]
    async fn test_diagnostic_prefers_stderr_then_stdout() {
        let runner = FakeRunner::new(|_| Ok(exited(1, "out", "a.c:1: error")));
        let result = compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .unwrap();
        assert_eq!(result.message.as_deref(), Some("a.c:1: error"));

        let runner = FakeRunner::new(|_| Ok(exited(1, "Main.java:3: error", "")));
        let result = compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .unwrap();
        assert_eq!(result.message.as_deref(), Some("Main.java:3: error"));
    }

    #[tokio::test]
    async fn test_diagnostic_is_trimmed() {
        let runner = FakeRunner::new(|_| Ok(exited(1, "", "\na.c:1: error: expected ';'\n\n")));
        let result = compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .unwrap();
        assert_eq!(result.message.as_deref(), Some("a.c:1: error: expected ';'"));

        let runner = FakeRunner::new(|_| Ok(exited(1, "  Main.java:3: error\n", "\n")));
        let result = compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .unwrap();
        assert_eq!(result.message.as_deref(), Some("Main.java:3: error"));
    }

    #[tokio::test]
    async fn test_silent_failures_get_status_message() {
        let runner = FakeRunner::new(|_| Ok(exited(4, "", "")));
        let result = compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("Compilation failed with exit code 4")
        );

        let runner = FakeRunner::new(|_| Ok(timed_out()));
        let result = compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .unwrap();
        assert_eq!(result.message.as_deref(), Some("Compilation timed out"));
    }

    #[tokio::test]
    async fn test_spawn_failure_propagates() {
        let runner = FakeRunner::new(|_| Err(anyhow::anyhow!("No such file or directory")));
        assert!(compile(&runner, &gcc(), &RunLimits::new(1_000, 1024))
            .await
            .is_err());
    }
}
