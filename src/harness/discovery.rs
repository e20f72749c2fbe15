//! Entry point resolution
//!
//! A declared entry point always wins. Discovery from source text is a
//! compatibility path for problems that do not declare one; it takes the
//! first definition that looks like a function, so submissions with helper
//! functions defined before the solution resolve to the helper.

use lazy_regex::{lazy_regex, Lazy, Regex};
use tracing::{debug, warn};

use crate::error::HarnessError;
use crate::languages::Language;

/// Name assumed when neither a declaration nor discovery yields one
pub const DEFAULT_ENTRY_POINT: &str = "twoSum";

static RE_IDENTIFIER: Lazy<Regex> = lazy_regex!(r"^[A-Za-z_][A-Za-z0-9_]*$");

static RE_PYTHON_DEF: Lazy<Regex> =
    lazy_regex!(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)[ \t]*\(");

static RE_JS_FUNCTION: Lazy<Regex> = lazy_regex!(
    r"(?:async\s+)?function\s*\*?\s*([A-Za-z_]\w*)\s*\(|(?:const|let|var)\s+([A-Za-z_]\w*)\s*="
);

static RE_JAVA_METHOD: Lazy<Regex> = lazy_regex!(
    r"(?:public|private|protected)\s+(?:static\s+)?(?:final\s+)?[\w\[\]<>,?\s]+?\s+([A-Za-z_]\w*)\s*\("
);

static RE_C_FUNCTION: Lazy<Regex> = lazy_regex!(
    r"(?m)^[ \t]*([A-Za-z_][\w:<>,\s]*?)(?:\s*[\*&]+\s*|\s+)([A-Za-z_]\w*)\s*\("
);

const C_NON_TYPES: &[&str] = &[
    "return", "else", "new", "delete", "throw", "case", "goto", "if", "while", "for", "switch",
    "do", "sizeof",
];

/// Find the candidate function's name in `source`
pub fn discover_entry_point(language: Language, source: &str) -> Option<String> {
    match language {
        Language::Python => RE_PYTHON_DEF
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .next(),
        Language::Javascript => RE_JS_FUNCTION
            .captures_iter(source)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
            .next(),
        Language::Java => RE_JAVA_METHOD
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .find(|name| name != "main"),
        Language::Cpp | Language::C => RE_C_FUNCTION
            .captures_iter(source)
            .filter(|caps| {
                let leading = caps[1].split_whitespace().next().unwrap_or_default();
                !C_NON_TYPES.contains(&leading) && !C_NON_TYPES.contains(&&caps[2])
            })
            .map(|caps| caps[2].to_string())
            .find(|name| name != "main"),
    }
}

/// Name of the function the harness calls
pub fn resolve_entry_point(
    language: Language,
    source: &str,
    declared: Option<&str>,
) -> Result<String, HarnessError> {
    if let Some(name) = declared {
        let name = name.trim();
        if !RE_IDENTIFIER.is_match(name) {
            return Err(HarnessError::InvalidEntryPoint(name.to_string()));
        }
        return Ok(name.to_string());
    }

    match discover_entry_point(language, source) {
        Some(name) => {
            debug!("Discovered {} entry point: {}", language, name);
            Ok(name)
        }
        None => {
            warn!(
                "No {} function definition found, falling back to {}",
                language, DEFAULT_ENTRY_POINT
            );
            Ok(DEFAULT_ENTRY_POINT.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_python() {
        let source = "import math\n\ndef two_sum(nums, target):\n    pass\n";
        assert_eq!(
            discover_entry_point(Language::Python, source).as_deref(),
            Some("two_sum")
        );
    }

    #[test]
    fn test_discover_javascript() {
        assert_eq!(
            discover_entry_point(
                Language::Javascript,
                "function twoSum(nums, target) {\n  const seen = new Map();\n}"
            )
            .as_deref(),
            Some("twoSum")
        );
        assert_eq!(
            discover_entry_point(Language::Javascript, "const isPalindrome = (x) => true;")
                .as_deref(),
            Some("isPalindrome")
        );
    }

    #[test]
    fn test_discover_java() {
        let source = "public int[] twoSum(int[] nums, int target) {\n    return new int[0];\n}";
        assert_eq!(
            discover_entry_point(Language::Java, source).as_deref(),
            Some("twoSum")
        );

        let source = "public class Solution {\n    public List<Integer> order(Map<String, Integer> m) { return null; }\n}";
        assert_eq!(
            discover_entry_point(Language::Java, source).as_deref(),
            Some("order")
        );
    }

    #[test]
    fn test_discover_cpp_and_c() {
        let cpp = "vector<int> twoSum(vector<int>& nums, int target) {\n    return {};\n}";
        assert_eq!(
            discover_entry_point(Language::Cpp, cpp).as_deref(),
            Some("twoSum")
        );

        let c = "int* twoSum(int* nums, int numsSize, int target, int* returnSize) {\n    *returnSize = 0;\n    return NULL;\n}";
        assert_eq!(discover_entry_point(Language::C, c).as_deref(), Some("twoSum"));

        let c = "unsigned long long fib(int n) {\n    return n < 2 ? n : fib(n - 1) + fib(n - 2);\n}";
        assert_eq!(discover_entry_point(Language::C, c).as_deref(), Some("fib"));
    }

    #[test]
    fn test_discover_skips_statements() {
        let c = "  return helper(x);\n  else if (y) {}\nbool isPalindrome(int x) {\n}";
        assert_eq!(
            discover_entry_point(Language::C, c).as_deref(),
            Some("isPalindrome")
        );
    }

    #[test]
    fn test_resolve_prefers_declared_name() {
        let source = "def helper(x):\n    pass\n\ndef solve(x):\n    pass\n";
        assert_eq!(
            resolve_entry_point(Language::Python, source, Some("solve")).unwrap(),
            "solve"
        );
        assert_eq!(
            resolve_entry_point(Language::Python, source, None).unwrap(),
            "helper"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        assert_eq!(
            resolve_entry_point(Language::Java, "// nothing here", None).unwrap(),
            DEFAULT_ENTRY_POINT
        );
    }

    #[test]
    fn test_resolve_rejects_non_identifiers() {
        assert_eq!(
            resolve_entry_point(Language::Python, "", Some("os.system('x')")).unwrap_err(),
            HarnessError::InvalidEntryPoint("os.system('x')".into())
        );
    }
}
