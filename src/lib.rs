//! CodeAssess grader
//!
//! Grades candidate solutions in Python, JavaScript, Java, C++ and C by
//! wrapping them in a generated harness, building and running the harness
//! once per test case, and comparing the normalized output with the
//! expected value.

pub mod compiler;
pub mod config;
pub mod core;
pub mod error;
pub mod harness;
pub mod judger;
pub mod languages;
pub mod normalizer;
pub mod orchestrator;
pub mod runner;
pub mod worker;

pub use crate::config::GraderConfig;
pub use crate::core::{CodingProblem, ExecutionReport, ExecutionRequest, TestCase, TestResult, Verdict};
pub use crate::error::{ExecutionError, GradeError, HarnessError};
pub use crate::judger::Judger;
pub use crate::languages::{Language, LanguageTable};
