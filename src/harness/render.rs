//! Per-language program templates and literal marshaling
//!
//! Every harness prints the entry point's result on a single stdout line:
//! Python via `print(repr(...))`, everything else as JSON.

use lazy_regex::{lazy_regex, Lazy, Regex};
use serde_json::Value;

use super::signature::{Argument, ValueType};
use crate::error::HarnessError;
use crate::languages::Language;

static RE_JAVA_SOLUTION_CLASS: Lazy<Regex> =
    lazy_regex!(r"(?m)^[ \t]*(?:public[ \t]+)?(?:final[ \t]+)?class[ \t]+Solution\b");
static RE_JAVA_PUBLIC_SOLUTION: Lazy<Regex> =
    lazy_regex!(r"(?m)^([ \t]*)public[ \t]+((?:final[ \t]+)?class[ \t]+Solution\b)");
static RE_JAVA_IMPORT: Lazy<Regex> =
    lazy_regex!(r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?[\w.]+(?:\.\*)?[ \t]*;[ \t]*\r?\n?");
static RE_CPP_SOLUTION_CLASS: Lazy<Regex> = lazy_regex!(r"\b(?:class|struct)\s+Solution\b");
static RE_PYTHON_SOLUTION_CLASS: Lazy<Regex> = lazy_regex!(r"(?m)^class[ \t]+Solution\b");

pub fn python(source: &str, function: &str, args: &[Argument]) -> String {
    let call_args = args
        .iter()
        .map(|arg| python_literal(&arg.value))
        .collect::<Vec<_>>()
        .join(", ");

    let receiver = if RE_PYTHON_SOLUTION_CLASS.is_match(source)
        && !defines_top_level_python(source, function)
    {
        "Solution()."
    } else {
        ""
    };

    format!(
        r#"{source}


if __name__ == "__main__":
    __grader_result = {receiver}{function}({call_args})
    print(repr(__grader_result))
"#
    )
}

fn defines_top_level_python(source: &str, function: &str) -> bool {
    source.lines().any(|line| {
        let Some(rest) = line
            .strip_prefix("def ")
            .or_else(|| line.strip_prefix("async def "))
        else {
            return false;
        };
        rest.trim_start()
            .strip_prefix(function)
            .is_some_and(|after| after.trim_start().starts_with('('))
    })
}

pub fn javascript(source: &str, function: &str, args: &[Argument]) -> String {
    let call_args = args
        .iter()
        .map(|arg| arg.value.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"{source}

Promise.resolve({function}({call_args})).then((__graderResult) => {{
  console.log(JSON.stringify(__graderResult));
}});
"#
    )
}

pub fn java(
    source: &str,
    function: &str,
    args: &[Argument],
    class_name: &str,
) -> Result<String, HarnessError> {
    let mut decls = String::new();
    let mut names = Vec::with_capacity(args.len());
    for (idx, arg) in args.iter().enumerate() {
        let ty = typed(arg, Language::Java)?;
        let name = format!("arg{}", idx);
        decls.push_str(&format!(
            "        {} {} = {};\n",
            java_type(ty),
            name,
            java_literal(ty, &arg.value)
        ));
        names.push(name);
    }
    let call_args = names.join(", ");

    let imports = RE_JAVA_IMPORT
        .find_iter(source)
        .map(|m| m.as_str().trim())
        .collect::<Vec<_>>()
        .join("\n");
    let body = RE_JAVA_IMPORT.replace_all(source, "");

    // A candidate-declared `Solution` class stays a top-level class next to the
    // harness; bare methods become members of the harness class itself.
    let (top_level, members, target) = if RE_JAVA_SOLUTION_CLASS.is_match(&body) {
        let demoted = RE_JAVA_PUBLIC_SOLUTION.replace_all(&body, "$1$2");
        (demoted.into_owned(), String::new(), "Solution".to_string())
    } else {
        (String::new(), indent(&body, 4), class_name.to_string())
    };

    Ok(format!(
        r#"import java.util.*;
{imports}

{top_level}

public class {class_name} {{
{members}

    public static void main(String[] args) {{
{decls}        {target} __sol = new {target}();
        System.out.println(__toJson(__sol.{function}({call_args})));
    }}

    private static String __toJson(Object value) {{
        if (value == null) return "null";
        if (value instanceof String || value instanceof Character) return __quote(String.valueOf(value));
        if (value instanceof Boolean || value instanceof Number) return String.valueOf(value);
        if (value.getClass().isArray()) {{
            StringBuilder sb = new StringBuilder("[");
            int length = java.lang.reflect.Array.getLength(value);
            for (int i = 0; i < length; i++) {{
                if (i > 0) sb.append(", ");
                sb.append(__toJson(java.lang.reflect.Array.get(value, i)));
            }}
            return sb.append("]").toString();
        }}
        if (value instanceof Iterable) {{
            StringBuilder sb = new StringBuilder("[");
            boolean first = true;
            for (Object item : (Iterable<?>) value) {{
                if (!first) sb.append(", ");
                sb.append(__toJson(item));
                first = false;
            }}
            return sb.append("]").toString();
        }}
        if (value instanceof Map) {{
            StringBuilder sb = new StringBuilder("{{");
            boolean first = true;
            for (Map.Entry<?, ?> entry : ((Map<?, ?>) value).entrySet()) {{
                if (!first) sb.append(", ");
                sb.append(__quote(String.valueOf(entry.getKey()))).append(": ").append(__toJson(entry.getValue()));
                first = false;
            }}
            return sb.append("}}").toString();
        }}
        return __quote(String.valueOf(value));
    }}

    private static String __quote(String s) {{
        StringBuilder sb = new StringBuilder("\"");
        for (int i = 0; i < s.length(); i++) {{
            char c = s.charAt(i);
            if (c == '"' || c == '\\') sb.append('\\').append(c);
            else if (c == '\n') sb.append("\\n");
            else if (c == '\r') sb.append("\\r");
            else if (c == '\t') sb.append("\\t");
            else if (c < 0x20) sb.append(String.format("\\u%04x", (int) c));
            else sb.append(c);
        }}
        return sb.append('"').toString();
    }}
}}
"#
    ))
}

pub fn cpp(source: &str, function: &str, args: &[Argument]) -> Result<String, HarnessError> {
    let mut decls = String::new();
    let mut names = Vec::with_capacity(args.len());
    for (idx, arg) in args.iter().enumerate() {
        let ty = typed(arg, Language::Cpp)?;
        let name = format!("arg{}", idx);
        decls.push_str(&format!(
            "    {} {} = {};\n",
            cpp_type(ty),
            name,
            cpp_literal(ty, &arg.value)
        ));
        names.push(name);
    }
    let call_args = names.join(", ");

    // LeetCode-style submissions wrap the method in `class Solution`
    let receiver = if RE_CPP_SOLUTION_CLASS.is_match(source) {
        "Solution()."
    } else {
        ""
    };

    Ok(format!(
        r#"#include <algorithm>
#include <climits>
#include <cmath>
#include <deque>
#include <functional>
#include <iomanip>
#include <iostream>
#include <map>
#include <numeric>
#include <queue>
#include <set>
#include <sstream>
#include <stack>
#include <string>
#include <unordered_map>
#include <unordered_set>
#include <utility>
#include <vector>
using namespace std;

{source}

static std::string grader_quote(const std::string& s) {{
    std::ostringstream os;
    os << '"';
    for (unsigned char c : s) {{
        if (c == '"' || c == '\\') os << '\\' << c;
        else if (c == '\n') os << "\\n";
        else if (c == '\r') os << "\\r";
        else if (c == '\t') os << "\\t";
        else if (c < 0x20) os << "\\u" << std::hex << std::setw(4) << std::setfill('0') << (int) c << std::dec;
        else os << c;
    }}
    os << '"';
    return os.str();
}}

static std::string grader_to_json(bool v) {{ return v ? "true" : "false"; }}
static std::string grader_to_json(int v) {{ return std::to_string(v); }}
static std::string grader_to_json(unsigned int v) {{ return std::to_string(v); }}
static std::string grader_to_json(long v) {{ return std::to_string(v); }}
static std::string grader_to_json(unsigned long v) {{ return std::to_string(v); }}
static std::string grader_to_json(long long v) {{ return std::to_string(v); }}
static std::string grader_to_json(unsigned long long v) {{ return std::to_string(v); }}
static std::string grader_to_json(double v) {{
    std::ostringstream os;
    os << std::setprecision(17) << v;
    return os.str();
}}
static std::string grader_to_json(char c) {{ return grader_quote(std::string(1, c)); }}
static std::string grader_to_json(const std::string& s) {{ return grader_quote(s); }}
static std::string grader_to_json(const char* s) {{ return s == nullptr ? "null" : grader_quote(s); }}

template <typename T>
static std::string grader_to_json(const std::vector<T>& v) {{
    std::string out = "[";
    for (std::size_t i = 0; i < v.size(); i++) {{
        if (i > 0) out += ", ";
        out += grader_to_json(static_cast<T>(v[i]));
    }}
    return out + "]";
}}

int main() {{
{decls}    std::cout << grader_to_json({receiver}{function}({call_args})) << std::endl;
    return 0;
}}
"#
    ))
}

/// C has no overloading, so the result type must be known up front. Array
/// parameters are passed followed by their length; array results are read
/// through a trailing `int*` length out-parameter.
pub fn c(
    source: &str,
    function: &str,
    args: &[Argument],
    returns: Option<ValueType>,
) -> Result<String, HarnessError> {
    let returns = returns.ok_or_else(|| HarnessError::UninferableType {
        name: "return value".to_string(),
        language: Language::C,
        value: "null".to_string(),
    })?;

    let mut decls = String::new();
    let mut call_args = Vec::with_capacity(args.len() + 1);
    for (idx, arg) in args.iter().enumerate() {
        let ty = typed(arg, Language::C)?;
        let name = format!("arg{}", idx);
        match (ty.element(), &arg.value) {
            (Some(element), Value::Array(items)) => {
                let literals = items
                    .iter()
                    .map(|item| c_literal(element, item))
                    .collect::<Vec<_>>();
                if literals.is_empty() {
                    decls.push_str(&format!(
                        "    {} {}[1] = {{0}};\n",
                        c_type(element),
                        name
                    ));
                } else {
                    decls.push_str(&format!(
                        "    {} {}[] = {{{}}};\n",
                        c_type(element),
                        name,
                        literals.join(", ")
                    ));
                }
                decls.push_str(&format!("    int {}_size = {};\n", name, items.len()));
                call_args.push(name.clone());
                call_args.push(format!("{}_size", name));
            }
            _ if ty == ValueType::String => {
                decls.push_str(&format!(
                    "    char {}[] = {};\n",
                    name,
                    c_literal(ty, &arg.value)
                ));
                call_args.push(name);
            }
            _ => {
                decls.push_str(&format!(
                    "    {} {} = {};\n",
                    c_type(ty),
                    name,
                    c_literal(ty, &arg.value)
                ));
                call_args.push(name);
            }
        }
    }

    let print = match returns.element() {
        Some(element) => {
            call_args.push("&grader_return_size".to_string());
            format!(
                "    int grader_return_size = 0;\n    {elem}* grader_result = {function}({args});\n    printf(\"[\");\n    for (int i = 0; i < grader_return_size; i++) {{\n        if (i > 0) printf(\", \");\n        {emit};\n    }}\n    printf(\"]\\n\");\n",
                elem = c_type(element),
                function = function,
                args = call_args.join(", "),
                emit = c_emit(element, "grader_result[i]"),
            )
        }
        None => format!(
            "    {ty} grader_result = {function}({args});\n    {emit};\n    printf(\"\\n\");\n",
            ty = if returns == ValueType::String {
                "const char*"
            } else {
                c_type(returns)
            },
            function = function,
            args = call_args.join(", "),
            emit = c_emit(returns, "grader_result"),
        ),
    };

    Ok(format!(
        r#"#include <limits.h>
#include <math.h>
#include <stdbool.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>

{source}

static void grader_print_string(const char* s) {{
    if (s == NULL) {{
        printf("null");
        return;
    }}
    putchar('"');
    for (const unsigned char* p = (const unsigned char*) s; *p; p++) {{
        if (*p == '"' || *p == '\\') printf("\\%c", *p);
        else if (*p == '\n') printf("\\n");
        else if (*p == '\r') printf("\\r");
        else if (*p == '\t') printf("\\t");
        else if (*p < 0x20) printf("\\u%04x", *p);
        else putchar(*p);
    }}
    putchar('"');
}}

int main(void) {{
{decls}{print}    return 0;
}}
"#
    ))
}

fn typed(arg: &Argument, language: Language) -> Result<ValueType, HarnessError> {
    arg.value_type()
        .ok_or_else(|| HarnessError::UninferableType {
            name: arg.name.clone(),
            language,
            value: arg.value.to_string(),
        })
}

fn indent(source: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    source
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(python_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(k, v)| format!("{}: {}", Value::String(k.clone()), python_literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// String literal valid in C, C++ and Java source
fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn float_literal(value: &Value) -> String {
    let v = value.as_f64().unwrap_or_default();
    let s = format!("{:?}", v);
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}

fn integer_literal(value: &Value, suffix: &str) -> String {
    match value.as_i64() {
        Some(i64::MIN) => format!("(-9223372036854775807{} - 1)", suffix),
        Some(v) => format!("{}{}", v, suffix),
        None => format!("0{}", suffix),
    }
}

fn array_literal(
    value: &Value,
    element: ValueType,
    open: &str,
    close: &str,
    scalar: fn(ValueType, &Value) -> String,
) -> String {
    let items = value
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| scalar(element, item))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    format!("{}{}{}", open, items, close)
}

fn java_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Int => "int",
        ValueType::Long => "long",
        ValueType::Float => "double",
        ValueType::Bool => "boolean",
        ValueType::String => "String",
        ValueType::IntArray => "int[]",
        ValueType::LongArray => "long[]",
        ValueType::FloatArray => "double[]",
        ValueType::BoolArray => "boolean[]",
        ValueType::StringArray => "String[]",
    }
}

fn java_literal(ty: ValueType, value: &Value) -> String {
    match ty {
        ValueType::Int => integer_literal(value, ""),
        ValueType::Long => match value.as_i64() {
            Some(i64::MIN) => "Long.MIN_VALUE".to_string(),
            _ => integer_literal(value, "L"),
        },
        ValueType::Float => float_literal(value),
        ValueType::Bool => value.as_bool().unwrap_or_default().to_string(),
        ValueType::String => quoted(value.as_str().unwrap_or_default()),
        array => array_literal(
            value,
            array.element().unwrap_or(ValueType::Int),
            "{",
            "}",
            java_literal,
        ),
    }
}

fn cpp_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Int => "int",
        ValueType::Long => "long long",
        ValueType::Float => "double",
        ValueType::Bool => "bool",
        ValueType::String => "string",
        ValueType::IntArray => "vector<int>",
        ValueType::LongArray => "vector<long long>",
        ValueType::FloatArray => "vector<double>",
        ValueType::BoolArray => "vector<bool>",
        ValueType::StringArray => "vector<string>",
    }
}

fn cpp_literal(ty: ValueType, value: &Value) -> String {
    match ty {
        ValueType::Int => integer_literal(value, ""),
        ValueType::Long => integer_literal(value, "LL"),
        ValueType::Float => float_literal(value),
        ValueType::Bool => value.as_bool().unwrap_or_default().to_string(),
        ValueType::String => quoted(value.as_str().unwrap_or_default()),
        array => array_literal(
            value,
            array.element().unwrap_or(ValueType::Int),
            "{",
            "}",
            cpp_literal,
        ),
    }
}

fn c_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Int => "int",
        ValueType::Long => "long long",
        ValueType::Float => "double",
        ValueType::Bool => "bool",
        ValueType::String => "char*",
        ValueType::IntArray => "int*",
        ValueType::LongArray => "long long*",
        ValueType::FloatArray => "double*",
        ValueType::BoolArray => "bool*",
        ValueType::StringArray => "char**",
    }
}

fn c_literal(ty: ValueType, value: &Value) -> String {
    match ty {
        ValueType::Long => integer_literal(value, "LL"),
        other => cpp_literal(other, value),
    }
}

fn c_emit(ty: ValueType, expr: &str) -> String {
    match ty {
        ValueType::Int => format!("printf(\"%d\", {})", expr),
        ValueType::Long => format!("printf(\"%lld\", {})", expr),
        ValueType::Float => format!("printf(\"%.17g\", {})", expr),
        ValueType::Bool => format!("printf(\"%s\", {} ? \"true\" : \"false\")", expr),
        _ => format!("grader_print_string({})", expr),
    }
}
