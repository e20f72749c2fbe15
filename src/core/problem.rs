//! Coding problem definition as supplied by the problem store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{ExecutionRequest, TestCase};
use crate::harness::signature::Signature;
use crate::languages::Language;

/// Read-only problem definition handed to the grader
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodingProblem {
    pub test_cases: Vec<TestCase>,
    /// Starting code shown to the candidate, per language
    #[serde(default)]
    pub template_code: BTreeMap<Language, String>,
    /// Function the grader calls, per language (`two_sum` in Python, `twoSum` in Java, ...)
    #[serde(default)]
    pub entry_points: BTreeMap<Language, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl CodingProblem {
    pub fn template_for(&self, language: Language) -> Option<&str> {
        self.template_code.get(&language).map(String::as_str)
    }

    pub fn entry_point_for(&self, language: Language) -> Option<&str> {
        self.entry_points.get(&language).map(String::as_str)
    }

    /// Build the request grading `source_code` against this problem's test cases
    pub fn request_for(&self, language: Language, source_code: &str) -> ExecutionRequest {
        let mut request = ExecutionRequest::new(source_code, language, self.test_cases.clone());
        if let Some(entry_point) = self.entry_point_for(language) {
            request = request.with_entry_point(entry_point);
        }
        if let Some(signature) = &self.signature {
            request = request.with_signature(signature.clone());
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_problem_round_trips_language_keys() {
        let problem: CodingProblem = serde_json::from_value(json!({
            "testCases": [{"input": {"x": 121}, "output": true}],
            "templateCode": {
                "python": "def is_palindrome(x):\n    pass",
                "java": "public boolean isPalindrome(int x) {\n    return false;\n}"
            },
            "entryPoints": {"python": "is_palindrome", "java": "isPalindrome"}
        }))
        .unwrap();

        assert_eq!(problem.test_cases.len(), 1);
        assert!(problem
            .template_for(Language::Python)
            .unwrap()
            .starts_with("def is_palindrome"));
        assert_eq!(problem.template_for(Language::C), None);
        assert_eq!(problem.entry_point_for(Language::Java), Some("isPalindrome"));
    }

    #[test]
    fn test_request_for_uses_language_entry_point() {
        let mut problem = CodingProblem::default();
        problem
            .entry_points
            .insert(Language::Python, "is_palindrome".into());
        problem
            .test_cases
            .push(TestCase::new(json!({"x": 10}), json!(false)));

        let request = problem.request_for(Language::Python, "def is_palindrome(x): ...");
        assert_eq!(request.entry_point.as_deref(), Some("is_palindrome"));
        assert_eq!(request.test_cases.len(), 1);

        let request = problem.request_for(Language::Javascript, "function f(x) {}");
        assert_eq!(request.entry_point, None);
    }
}
