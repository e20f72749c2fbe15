//! Harness generation: wrap candidate source in a runnable program that
//! calls the entry point with one test input and prints the result.

pub mod discovery;
pub mod render;
pub mod signature;

use serde_json::Value;

use crate::error::HarnessError;
use crate::languages::Language;

pub use discovery::{discover_entry_point, resolve_entry_point, DEFAULT_ENTRY_POINT};
pub use signature::{bind_arguments, Argument, Param, Signature, ValueType};

/// Everything needed to render one test case's program
#[derive(Debug, Clone, Copy)]
pub struct HarnessInput<'a> {
    pub source: &'a str,
    pub language: Language,
    pub input: &'a Value,
    /// Used only to infer a C return type when no signature declares one
    pub expected_output: &'a Value,
    pub entry_point: Option<&'a str>,
    pub signature: Option<&'a Signature>,
}

/// A complete program ready to be written to the scratch source file
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    pub language: Language,
    /// Resolved entry point name
    pub function: String,
    pub text: String,
}

/// Render the harness for `input`. `program_name` is the scratch identity;
/// Java uses it as the public class name.
pub fn generate(
    input: &HarnessInput<'_>,
    program_name: &str,
) -> Result<GeneratedProgram, HarnessError> {
    let function = resolve_entry_point(input.language, input.source, input.entry_point)?;
    let args = bind_arguments(input.input, input.signature)?;

    let text = match input.language {
        Language::Python => render::python(input.source, &function, &args),
        Language::Javascript => render::javascript(input.source, &function, &args),
        Language::Java => render::java(input.source, &function, &args, program_name)?,
        Language::Cpp => render::cpp(input.source, &function, &args)?,
        Language::C => {
            let returns = signature::return_type(input.signature, input.expected_output);
            render::c(input.source, &function, &args, returns)?
        }
    };

    Ok(GeneratedProgram {
        language: input.language,
        function,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn harness<'a>(
        source: &'a str,
        language: Language,
        input: &'a Value,
        expected: &'a Value,
    ) -> HarnessInput<'a> {
        HarnessInput {
            source,
            language,
            input,
            expected_output: expected,
            entry_point: None,
            signature: None,
        }
    }

    #[test]
    fn test_generate_discovers_entry_point() {
        let input = json!({"x": 121});
        let expected = json!(true);
        let program = generate(
            &harness(
                "def is_palindrome(x):\n    return str(x) == str(x)[::-1]\n",
                Language::Python,
                &input,
                &expected,
            ),
            "Solution_1_abc",
        )
        .unwrap();

        assert_eq!(program.function, "is_palindrome");
        assert!(program.text.contains("is_palindrome(121)"));
    }

    #[test]
    fn test_generate_uses_declared_entry_point_and_signature() {
        let input = json!({"nums": [1, 2], "target": 3});
        let expected = json!([0, 1]);
        let signature = Signature {
            params: vec![
                Param::new("nums", ValueType::LongArray),
                Param::new("target", ValueType::Long),
            ],
            returns: Some(ValueType::IntArray),
        };
        let mut spec = harness(
            "vector<int> helper() { return {}; }\nvector<int> solve(vector<long long> n, long long t) { return {}; }",
            Language::Cpp,
            &input,
            &expected,
        );
        spec.entry_point = Some("solve");
        spec.signature = Some(&signature);

        let program = generate(&spec, "Solution_1_abc").unwrap();
        assert_eq!(program.function, "solve");
        assert!(program.text.contains("vector<long long> arg0 = {1LL, 2LL};"));
        assert!(program.text.contains("long long arg1 = 3LL;"));
    }

    #[test]
    fn test_generate_c_infers_return_from_expected_output() {
        let input = json!({"x": 121});
        let expected = json!(true);
        let program = generate(
            &harness("bool isPalindrome(int x) { return true; }", Language::C, &input, &expected),
            "Solution_1_abc",
        )
        .unwrap();
        assert!(program.text.contains("bool grader_result = isPalindrome(arg0);"));
    }

    #[test]
    fn test_generate_propagates_binding_errors() {
        let input = json!({"y": 1});
        let expected = json!(1);
        let signature = Signature {
            params: vec![Param::new("x", ValueType::Int)],
            returns: None,
        };
        let mut spec = harness("function f(x) { return x; }", Language::Javascript, &input, &expected);
        spec.signature = Some(&signature);

        assert_eq!(
            generate(&spec, "Solution_1_abc").unwrap_err(),
            HarnessError::MissingArgument("x".into())
        );
    }
}
