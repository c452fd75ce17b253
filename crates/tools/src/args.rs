//! Argument extraction shared by the built-in tools.
//!
//! Models are sloppy with types: numbers arrive as strings, booleans as
//! `"true"`. Extraction is lenient where the intent is unambiguous and raises
//! `InvalidArguments` otherwise.

use opencursor_core::error::ToolError;
use opencursor_core::tool::ToolArguments;
use serde_json::Value;

fn present<'a>(args: &'a ToolArguments, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|v| !v.is_null())
}

fn wrong_type(name: &str, expected: &str) -> ToolError {
    ToolError::InvalidArguments(format!("argument '{name}' must be {expected}"))
}

pub fn required_str<'a>(args: &'a ToolArguments, name: &str) -> Result<&'a str, ToolError> {
    optional_str(args, name)?.ok_or_else(|| ToolError::missing_argument(name))
}

pub fn optional_str<'a>(args: &'a ToolArguments, name: &str) -> Result<Option<&'a str>, ToolError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(wrong_type(name, "a string")),
    }
}

pub fn optional_bool(args: &ToolArguments, name: &str, default: bool) -> Result<bool, ToolError> {
    match present(args, name) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(wrong_type(name, "a boolean")),
        },
        Some(_) => Err(wrong_type(name, "a boolean")),
    }
}

pub fn required_i64(args: &ToolArguments, name: &str) -> Result<i64, ToolError> {
    optional_i64(args, name)?.ok_or_else(|| ToolError::missing_argument(name))
}

pub fn optional_i64(args: &ToolArguments, name: &str) -> Result<Option<i64>, ToolError> {
    let Some(value) = present(args, name) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| wrong_type(name, "an integer"))
}

/// A list of strings; a lone string is accepted as a one-element list.
pub fn string_list(args: &ToolArguments, name: &str) -> Result<Vec<String>, ToolError> {
    optional_string_list(args, name)?.ok_or_else(|| ToolError::missing_argument(name))
}

pub fn optional_string_list(
    args: &ToolArguments,
    name: &str,
) -> Result<Option<Vec<String>>, ToolError> {
    match present(args, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| wrong_type(name, "a list of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(wrong_type(name, "a list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> ToolArguments {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn strings() {
        let a = args(json!({"path": "a.rs", "n": 3, "none": null}));
        assert_eq!(required_str(&a, "path").unwrap(), "a.rs");
        assert_eq!(optional_str(&a, "none").unwrap(), None);
        assert_eq!(
            required_str(&a, "missing").unwrap_err().to_string(),
            "missing required argument 'missing'"
        );
        assert_eq!(
            required_str(&a, "n").unwrap_err().to_string(),
            "argument 'n' must be a string"
        );
    }

    #[test]
    fn integers_are_lenient() {
        let a = args(json!({"a": 2, "b": "3", "c": 4.0, "d": 4.5, "e": "x"}));
        assert_eq!(required_i64(&a, "a").unwrap(), 2);
        assert_eq!(required_i64(&a, "b").unwrap(), 3);
        assert_eq!(required_i64(&a, "c").unwrap(), 4);
        assert!(required_i64(&a, "d").is_err());
        assert!(required_i64(&a, "e").is_err());
        assert_eq!(optional_i64(&a, "z").unwrap(), None);
    }

    #[test]
    fn booleans() {
        let a = args(json!({"t": true, "s": "false", "bad": 7}));
        assert!(optional_bool(&a, "t", false).unwrap());
        assert!(!optional_bool(&a, "s", true).unwrap());
        assert!(optional_bool(&a, "missing", true).unwrap());
        assert!(optional_bool(&a, "bad", true).is_err());
    }

    #[test]
    fn lists() {
        let a = args(json!({"urls": ["a", "b"], "one": "c", "bad": [1]}));
        assert_eq!(string_list(&a, "urls").unwrap(), vec!["a", "b"]);
        assert_eq!(string_list(&a, "one").unwrap(), vec!["c"]);
        assert!(string_list(&a, "bad").is_err());
    }
}
