//! Output normalization and comparison
//!
//! Turns a program's stdout into a JSON value according to the language's
//! output grammar, and decides whether it matches the expected output.
//! Parsing never fails: anything unrecognized is kept as the trimmed string.

use serde_json::{Number, Value};

use crate::languages::OutputGrammar;

/// Parse `stdout` into a value
pub fn parse_output(stdout: &str, grammar: OutputGrammar) -> Value {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }

    let parsed = match grammar {
        OutputGrammar::Json => serde_json::from_str(trimmed).ok(),
        OutputGrammar::PythonLiteral => python_literal_to_json(trimmed)
            .and_then(|json| serde_json::from_str(&json).ok())
            .or_else(|| serde_json::from_str(trimmed).ok()),
        OutputGrammar::BracketedList => serde_json::from_str(trimmed)
            .ok()
            .or_else(|| parse_bracketed_list(trimmed)),
    };

    parsed.unwrap_or_else(|| Value::String(trimmed.to_string()))
}

/// Whether `actual` matches `expected`
pub fn outputs_match(actual: &Value, expected: &Value) -> bool {
    values_equal(actual, expected)
}

/// Deep equality where numbers compare by value. Strings never equal numbers.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Rewrite a Python literal (`repr` output) as JSON text.
///
/// Handles single and double quoted strings, `True`/`False`/`None`, tuples
/// and trailing commas. Returns `None` on anything it cannot tokenize.
fn python_literal_to_json(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => out.push_str(&python_string(c, &mut chars)?),
            '(' => out.push('['),
            ')' => {
                strip_trailing_comma(&mut out);
                out.push(']');
            }
            ']' | '}' => {
                strip_trailing_comma(&mut out);
                out.push(c);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    "inf" => out.push_str("\"inf\""),
                    "nan" => out.push_str("\"nan\""),
                    // exponent of a float such as 1e-05
                    w if w.starts_with(['e', 'E'])
                        && out.ends_with(|p: char| p.is_ascii_digit() || p == '.') =>
                    {
                        out.push_str(w)
                    }
                    _ => return None,
                }
            }
            c => out.push(c),
        }
    }

    Some(out)
}

fn python_string(quote: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut value = String::new();
    loop {
        let c = chars.next()?;
        match c {
            c if c == quote => break,
            '\\' => match chars.next()? {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                'x' => {
                    let hex: String = [chars.next()?, chars.next()?].iter().collect();
                    value.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                }
                'u' => {
                    let hex: String = (0..4).map(|_| chars.next()).collect::<Option<_>>()?;
                    value.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                }
                'U' => {
                    let hex: String = (0..8).map(|_| chars.next()).collect::<Option<_>>()?;
                    value.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                }
                other => value.push(other),
            },
            c => value.push(c),
        }
    }
    serde_json::to_string(&value).ok()
}

fn strip_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

/// Parse `[a, b, c]` where elements are not valid JSON on their own terms,
/// e.g. `[hello, world]` printed by a list of unquoted strings.
fn parse_bracketed_list(text: &str) -> Option<Value> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Value::Array(vec![]));
    }
    if inner.contains('[') {
        return None;
    }

    let items = inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            serde_json::from_str(item).unwrap_or_else(|_| Value::String(item.to_string()))
        })
        .collect();
    Some(Value::Array(items))
}
