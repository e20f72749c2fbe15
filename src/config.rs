//! Grader configuration, loaded from the environment

use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::orchestrator::ExecutionLimits;

/// Grader configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GraderConfig {
    /// Directory under which per-attempt scratch directories are created
    /// (default: `<tmp>/codeassess`)
    pub scratch_dir: PathBuf,
    /// Wall-clock limit per program run in milliseconds (default: 10000ms)
    pub run_time_limit_ms: u64,
    /// Wall-clock limit per compilation in milliseconds (default: 30000ms)
    pub compile_time_limit_ms: u64,
    /// Bytes of stdout/stderr kept per stream (default: 1 MiB)
    pub max_output_bytes: usize,
    /// Language table override; the embedded table is used when unset
    pub languages_config: Option<PathBuf>,
    pub redis_url: String,
}

impl Default for GraderConfig {
    fn default() -> Self {
        let limits = ExecutionLimits::default();
        Self {
            scratch_dir: std::env::temp_dir().join("codeassess"),
            run_time_limit_ms: limits.run_time_limit_ms,
            compile_time_limit_ms: limits.compile_time_limit_ms,
            max_output_bytes: limits.max_output_bytes,
            languages_config: None,
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

impl GraderConfig {
    /// Read configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            scratch_dir: lookup("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            run_time_limit_ms: parse_or(
                "RUN_TIME_LIMIT_MS",
                lookup("RUN_TIME_LIMIT_MS"),
                defaults.run_time_limit_ms,
            ),
            compile_time_limit_ms: parse_or(
                "COMPILE_TIME_LIMIT_MS",
                lookup("COMPILE_TIME_LIMIT_MS"),
                defaults.compile_time_limit_ms,
            ),
            max_output_bytes: parse_or(
                "MAX_OUTPUT_BYTES",
                lookup("MAX_OUTPUT_BYTES"),
                defaults.max_output_bytes,
            ),
            languages_config: lookup("LANGUAGES_CONFIG").map(PathBuf::from),
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
        }
    }

    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            run_time_limit_ms: self.run_time_limit_ms,
            compile_time_limit_ms: self.compile_time_limit_ms,
            max_output_bytes: self.max_output_bytes,
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
