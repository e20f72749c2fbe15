//! Execution coordinator
//!
//! Grades a submission against its test cases, one at a time and in order.
//! Every test case goes through harness generation, build-and-run and
//! output normalization on its own; a failure in any stage is recorded in
//! that test case's result and grading moves on to the next.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::GraderConfig;
use crate::core::{ExecutionReport, ExecutionRequest, TestCase, TestResult};
use crate::error::{ExecutionError, GradeError};
use crate::harness::{self, HarnessInput, Signature};
use crate::languages::{Language, LanguageConfig, LanguageTable};
use crate::normalizer;
use crate::orchestrator::Orchestrator;
use crate::runner::HostRunner;

pub struct Judger {
    orchestrator: Orchestrator,
}

/// Per-call context shared by every test case of one submission
struct Submission<'a> {
    source: &'a str,
    language: Language,
    config: &'a LanguageConfig,
    entry_point: Option<&'a str>,
    signature: Option<&'a Signature>,
}

impl Judger {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Judger that runs programs on the host with the configured limits
    pub fn from_config(
        config: &GraderConfig,
        languages: Arc<LanguageTable>,
    ) -> Result<Self, GradeError> {
        let orchestrator = Orchestrator::new(
            languages,
            Arc::new(HostRunner::new()),
            &config.scratch_dir,
            config.limits(),
        )?;
        Ok(Self::new(orchestrator))
    }

    pub fn languages(&self) -> &LanguageTable {
        self.orchestrator.languages()
    }

    /// Grade `source` against `test_cases`, discovering the entry point and
    /// inferring argument types from each input
    pub async fn execute_code(
        &self,
        source: &str,
        language: Language,
        test_cases: &[TestCase],
    ) -> Result<ExecutionReport, GradeError> {
        let config = self.languages().config_for(language)?;
        let submission = Submission {
            source,
            language,
            config,
            entry_point: None,
            signature: None,
        };
        Ok(self.grade(&submission, test_cases).await)
    }

    /// Grade a full request, honoring its declared entry point and signature
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionReport, GradeError> {
        let config = self.languages().config_for(request.language)?;
        let submission = Submission {
            source: &request.source_code,
            language: request.language,
            config,
            entry_point: request.entry_point.as_deref(),
            signature: request.signature.as_ref(),
        };
        Ok(self.grade(&submission, &request.test_cases).await)
    }

    async fn grade(&self, submission: &Submission<'_>, test_cases: &[TestCase]) -> ExecutionReport {
        info!(
            "Grading {} submission against {} test cases",
            submission.language,
            test_cases.len()
        );

        let started = Instant::now();
        let mut test_results = Vec::with_capacity(test_cases.len());
        for (idx, case) in test_cases.iter().enumerate() {
            let result = match self.run_single_test(submission, case).await {
                Ok((actual, passed)) => TestResult::judged(case, actual, passed),
                Err(e) => {
                    debug!("Test case {} failed: {}", idx, e);
                    TestResult::failed(case, &e)
                }
            };
            debug!("Test case {}: {}", idx, result.verdict);
            test_results.push(result);
        }
        let elapsed = started.elapsed().as_millis() as u64;

        let report = ExecutionReport::from_results(test_results, elapsed);
        info!(
            "Graded {} submission: {}/{} passed in {}ms",
            submission.language,
            report.passed_count(),
            report.total_count(),
            report.execution_time_ms
        );
        report
    }

    async fn run_single_test(
        &self,
        submission: &Submission<'_>,
        case: &TestCase,
    ) -> Result<(serde_json::Value, bool), ExecutionError> {
        let artifact = self.orchestrator.reserve(submission.config)?;

        let program = harness::generate(
            &HarnessInput {
                source: submission.source,
                language: submission.language,
                input: &case.input,
                expected_output: &case.expected_output,
                entry_point: submission.entry_point,
                signature: submission.signature,
            },
            artifact.program_name(),
        )?;

        let output = self
            .orchestrator
            .execute(artifact, submission.config, &program)
            .await?;

        let actual = normalizer::parse_output(&output.stdout, submission.config.output);
        let passed = normalizer::outputs_match(&actual, &case.expected_output);
        Ok((actual, passed))
    }
}
