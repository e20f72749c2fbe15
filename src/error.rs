//! Error taxonomy for the grading core
//!
//! - `GradeError`: aborts a whole grading call
//! - `ExecutionError`: localized to one test case, recorded in its `TestResult`
//! - `HarnessError`: the harness program could not be generated for a test input

use std::path::PathBuf;

use thiserror::Error;

use crate::core::verdict::Verdict;
use crate::harness::signature::ValueType;
use crate::languages::Language;

/// Errors that abort a grading call
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid language configuration: {0}")]
    Config(String),

    #[error("Failed to prepare scratch directory {path:?}: {source}")]
    ScratchRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single test case execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Compilation failed: {0}")]
    Compile(String),

    #[error("{0}")]
    Runtime(String),

    #[error("Execution timed out after {0}ms")]
    Timeout(u64),

    #[error("Harness generation failed: {0}")]
    Harness(#[from] HarnessError),

    #[error("Scratch file error: {0}")]
    Scratch(String),
}

impl ExecutionError {
    /// Verdict recorded for a test case that failed with this error
    pub fn verdict(&self) -> Verdict {
        match self {
            ExecutionError::Compile(_) => Verdict::CompileError,
            ExecutionError::Runtime(_) => Verdict::RuntimeError,
            ExecutionError::Timeout(_) => Verdict::TimeLimitExceeded,
            ExecutionError::Harness(_) | ExecutionError::Scratch(_) => Verdict::SystemError,
        }
    }
}

/// Reasons a harness program cannot be generated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HarnessError {
    #[error("Invalid entry point name: {0:?}")]
    InvalidEntryPoint(String),

    #[error("Missing argument `{0}` in test input")]
    MissingArgument(String),

    #[error("Argument `{name}` does not fit declared type {expected}: {value}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        value: String,
    },

    #[error("Cannot derive a {language} type for `{name}` from {value}")]
    UninferableType {
        name: String,
        language: Language,
        value: String,
    },
}
