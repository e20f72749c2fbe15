//! Data model shared by the coordinator and its callers

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::verdict::Verdict;
use crate::error::ExecutionError;
use crate::harness::signature::Signature;
use crate::languages::Language;

/// One input / expected output pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: Value,
    #[serde(alias = "output")]
    pub expected_output: Value,
}

impl TestCase {
    pub fn new(input: Value, expected_output: Value) -> Self {
        Self {
            input,
            expected_output,
        }
    }
}

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub passed: bool,
    pub verdict: Verdict,
    pub input: Value,
    pub expected_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<Value>,
    /// Compile / runtime / timeout diagnostic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    /// Result for a program that ran to completion and whose output was compared
    pub fn judged(case: &TestCase, actual_output: Value, passed: bool) -> Self {
        Self {
            passed,
            verdict: if passed {
                Verdict::Accepted
            } else {
                Verdict::WrongAnswer
            },
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            actual_output: Some(actual_output),
            error: None,
        }
    }

    /// Result for a test case that never produced comparable output
    pub fn failed(case: &TestCase, error: &ExecutionError) -> Self {
        Self {
            passed: false,
            verdict: error.verdict(),
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            actual_output: None,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregate verdict for one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub success: bool,
    pub execution_time_ms: u64,
    pub test_results: Vec<TestResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionReport {
    pub fn from_results(test_results: Vec<TestResult>, execution_time_ms: u64) -> Self {
        Self {
            success: test_results.iter().all(|r| r.passed),
            execution_time_ms,
            test_results,
            error: None,
        }
    }

    /// Report for a call that could not be carried out at all
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            execution_time_ms: 0,
            test_results: vec![],
            error: Some(message.into()),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.test_results.iter().filter(|r| r.passed).count()
    }

    pub fn total_count(&self) -> usize {
        self.test_results.len()
    }
}

/// Everything needed to grade one submission
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language: Language,
    pub test_cases: Vec<TestCase>,
    /// Declared name of the function to call. Discovered from the source when absent.
    pub entry_point: Option<String>,
    /// Declared parameter schema. Inferred from each test input when absent.
    pub signature: Option<Signature>,
}

impl ExecutionRequest {
    pub fn new(
        source_code: impl Into<String>,
        language: Language,
        test_cases: Vec<TestCase>,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            language,
            test_cases,
            entry_point: None,
            signature: None,
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_test_case_accepts_output_alias() {
        let case: TestCase =
            serde_json::from_value(json!({"input": {"x": 121}, "output": true})).unwrap();
        assert_eq!(case.expected_output, json!(true));
    }

    #[test]
    fn test_report_success_requires_every_pass() {
        let case = TestCase::new(json!({"x": 1}), json!(1));
        let pass = TestResult::judged(&case, json!(1), true);
        let fail = TestResult::judged(&case, json!(2), false);

        let report = ExecutionReport::from_results(vec![pass.clone(), pass.clone()], 5);
        assert!(report.success);
        assert_eq!(report.passed_count(), 2);

        let report = ExecutionReport::from_results(vec![pass, fail], 5);
        assert!(!report.success);
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.total_count(), 2);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let case = TestCase::new(json!({"x": 1}), json!(1));
        let failed = TestResult::failed(&case, &ExecutionError::Timeout(10_000));
        let report = ExecutionReport::from_results(vec![failed], 12);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["executionTimeMs"], json!(12));
        assert_eq!(value["testResults"][0]["verdict"], json!("time_limit_exceeded"));
        assert_eq!(value["testResults"][0]["expectedOutput"], json!(1));
        assert!(value["testResults"][0].get("actualOutput").is_none());
        assert!(value.get("error").is_none());
    }
}
