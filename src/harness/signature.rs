//! Parameter schema used to marshal test inputs into typed call expressions

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HarnessError;

/// Types a harness can declare in a statically typed language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "int[]")]
    IntArray,
    #[serde(rename = "long[]")]
    LongArray,
    #[serde(rename = "float[]")]
    FloatArray,
    #[serde(rename = "bool[]")]
    BoolArray,
    #[serde(rename = "string[]")]
    StringArray,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::String => "string",
            ValueType::IntArray => "int[]",
            ValueType::LongArray => "long[]",
            ValueType::FloatArray => "float[]",
            ValueType::BoolArray => "bool[]",
            ValueType::StringArray => "string[]",
        }
    }

    /// Element type of an array type
    pub fn element(&self) -> Option<ValueType> {
        match self {
            ValueType::IntArray => Some(ValueType::Int),
            ValueType::LongArray => Some(ValueType::Long),
            ValueType::FloatArray => Some(ValueType::Float),
            ValueType::BoolArray => Some(ValueType::Bool),
            ValueType::StringArray => Some(ValueType::String),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.element().is_some()
    }

    fn array_of(element: ValueType) -> Option<ValueType> {
        match element {
            ValueType::Int => Some(ValueType::IntArray),
            ValueType::Long => Some(ValueType::LongArray),
            ValueType::Float => Some(ValueType::FloatArray),
            ValueType::Bool => Some(ValueType::BoolArray),
            ValueType::String => Some(ValueType::StringArray),
            _ => None,
        }
    }

    /// Narrowest type that holds `value`, if any
    pub fn infer(value: &Value) -> Option<ValueType> {
        match value {
            Value::Array(items) => {
                let mut element: Option<ValueType> = None;
                for item in items {
                    let item_type = infer_scalar(item)?;
                    element = Some(match element {
                        None => item_type,
                        Some(current) => widen(current, item_type)?,
                    });
                }
                ValueType::array_of(element.unwrap_or(ValueType::Int))
            }
            scalar => infer_scalar(scalar),
        }
    }

    /// Whether `value` can be written as a literal of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Int, Value::Number(n)) => n
                .as_i64()
                .map(|v| i32::try_from(v).is_ok())
                .unwrap_or(false),
            (ValueType::Long, Value::Number(n)) => n.as_i64().is_some(),
            (ValueType::Float, Value::Number(_)) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::String, Value::String(_)) => true,
            (array, Value::Array(items)) if array.is_array() => {
                let element = array.element().unwrap_or(ValueType::Int);
                items.iter().all(|item| element.accepts(item))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn infer_scalar(value: &Value) -> Option<ValueType> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) if i32::try_from(v).is_ok() => Some(ValueType::Int),
            Some(_) => Some(ValueType::Long),
            None if n.is_f64() => Some(ValueType::Float),
            None => None,
        },
        Value::Bool(_) => Some(ValueType::Bool),
        Value::String(_) => Some(ValueType::String),
        _ => None,
    }
}

fn widen(a: ValueType, b: ValueType) -> Option<ValueType> {
    use ValueType::*;
    match (a, b) {
        _ if a == b => Some(a),
        (Int, Long) | (Long, Int) => Some(Long),
        (Int | Long, Float) | (Float, Int | Long) => Some(Float),
        _ => None,
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Declared call shape of a problem's entry point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ValueType>,
}

/// A test input value bound to a call position
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Parameter name (input field name, or `arg<N>` for positional inputs)
    pub name: String,
    pub value: Value,
    /// Declared type, if a signature was supplied
    pub declared: Option<ValueType>,
}

impl Argument {
    /// Declared type, or the type inferred from the value
    pub fn value_type(&self) -> Option<ValueType> {
        self.declared.or_else(|| ValueType::infer(&self.value))
    }
}

/// Bind a test input to call arguments.
///
/// With a signature, parameters are looked up by name in an object input
/// (or by position in an array input). Without one, object fields are taken
/// in their written order, array elements positionally, and any other value
/// becomes the single argument.
pub fn bind_arguments(
    input: &Value,
    signature: Option<&Signature>,
) -> Result<Vec<Argument>, HarnessError> {
    let Some(signature) = signature else {
        return Ok(infer_arguments(input));
    };

    signature
        .params
        .iter()
        .enumerate()
        .map(|(idx, param)| {
            let value = match input {
                Value::Object(fields) => fields.get(&param.name),
                Value::Array(items) => items.get(idx),
                scalar if signature.params.len() == 1 && !scalar.is_null() => Some(scalar),
                _ => None,
            }
            .ok_or_else(|| HarnessError::MissingArgument(param.name.clone()))?;

            if !param.ty.accepts(value) {
                return Err(HarnessError::TypeMismatch {
                    name: param.name.clone(),
                    expected: param.ty,
                    value: value.to_string(),
                });
            }

            Ok(Argument {
                name: param.name.clone(),
                value: value.clone(),
                declared: Some(param.ty),
            })
        })
        .collect()
}

fn infer_arguments(input: &Value) -> Vec<Argument> {
    let positional = |(idx, value): (usize, &Value)| Argument {
        name: format!("arg{}", idx),
        value: value.clone(),
        declared: None,
    };

    match input {
        Value::Object(fields) => fields
            .iter()
            .map(|(name, value)| Argument {
                name: name.clone(),
                value: value.clone(),
                declared: None,
            })
            .collect(),
        Value::Array(items) => items.iter().enumerate().map(positional).collect(),
        Value::Null => vec![],
        scalar => vec![positional((0, scalar))],
    }
}

/// Return type for harnesses that must know it up front (C)
pub fn return_type(
    signature: Option<&Signature>,
    expected_output: &Value,
) -> Option<ValueType> {
    signature
        .and_then(|sig| sig.returns)
        .or_else(|| ValueType::infer(expected_output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_two_sum_shape() {
        let args = bind_arguments(&json!({"nums": [2, 7, 11, 15], "target": 9}), None).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].name, "nums");
        assert_eq!(args[0].value_type(), Some(ValueType::IntArray));
        assert_eq!(args[1].name, "target");
        assert_eq!(args[1].value_type(), Some(ValueType::Int));
    }

    #[test]
    fn test_object_field_order_is_preserved() {
        let input: Value = serde_json::from_str(r#"{"target": 9, "nums": [1, 2]}"#).unwrap();
        let args = bind_arguments(&input, None).unwrap();
        assert_eq!(args[0].name, "target");
        assert_eq!(args[1].name, "nums");
    }

    #[test]
    fn test_infer_widens_numeric_arrays() {
        assert_eq!(ValueType::infer(&json!([1, 2.5])), Some(ValueType::FloatArray));
        assert_eq!(
            ValueType::infer(&json!([1, 10_000_000_000i64])),
            Some(ValueType::LongArray)
        );
        assert_eq!(ValueType::infer(&json!([])), Some(ValueType::IntArray));
        assert_eq!(ValueType::infer(&json!(["a", 1])), None);
        assert_eq!(ValueType::infer(&json!([[1], [2]])), None);
        assert_eq!(ValueType::infer(&json!({"a": 1})), None);
    }

    #[test]
    fn test_positional_and_scalar_inputs() {
        let args = bind_arguments(&json!([[3, 3], 6]), None).unwrap();
        assert_eq!(args[0].name, "arg0");
        assert_eq!(args[1].value, json!(6));

        let args = bind_arguments(&json!(121), None).unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].value_type(), Some(ValueType::Int));

        assert!(bind_arguments(&Value::Null, None).unwrap().is_empty());
    }

    #[test]
    fn test_signature_binds_by_name() {
        let signature = Signature {
            params: vec![
                Param::new("nums", ValueType::LongArray),
                Param::new("target", ValueType::Long),
            ],
            returns: Some(ValueType::IntArray),
        };
        let args = bind_arguments(&json!({"target": 9, "nums": [2, 7]}), Some(&signature)).unwrap();
        assert_eq!(args[0].name, "nums");
        assert_eq!(args[0].declared, Some(ValueType::LongArray));
        assert_eq!(args[1].value, json!(9));
    }

    #[test]
    fn test_signature_reports_missing_and_mismatched_arguments() {
        let signature = Signature {
            params: vec![Param::new("x", ValueType::Int)],
            returns: None,
        };
        assert_eq!(
            bind_arguments(&json!({"y": 1}), Some(&signature)).unwrap_err(),
            HarnessError::MissingArgument("x".into())
        );
        assert!(matches!(
            bind_arguments(&json!({"x": "1"}), Some(&signature)).unwrap_err(),
            HarnessError::TypeMismatch { expected: ValueType::Int, .. }
        ));
        assert!(matches!(
            bind_arguments(&json!({"x": 3_000_000_000i64}), Some(&signature)).unwrap_err(),
            HarnessError::TypeMismatch { .. }
        ));
        assert_eq!(bind_arguments(&json!(5), Some(&signature)).unwrap()[0].value, json!(5));
    }

    #[test]
    fn test_signature_deserializes_type_names() {
        let signature: Signature = serde_json::from_value(json!({
            "params": [{"name": "words", "type": "string[]"}],
            "returns": "bool"
        }))
        .unwrap();
        assert_eq!(signature.params[0].ty, ValueType::StringArray);
        assert_eq!(signature.returns, Some(ValueType::Bool));
    }

    #[test]
    fn test_return_type_prefers_declaration() {
        let signature = Signature {
            params: vec![],
            returns: Some(ValueType::LongArray),
        };
        assert_eq!(
            return_type(Some(&signature), &json!([0, 1])),
            Some(ValueType::LongArray)
        );
        assert_eq!(return_type(None, &json!(true)), Some(ValueType::Bool));
        assert_eq!(return_type(None, &Value::Null), None);
    }
}
