//! Field readers shared by the forms
//!
//! Raw values come straight from client JSON, so numbers may arrive as
//! strings and text may arrive as numbers. Readers coerce where that is
//! unambiguous and record a field error otherwise.

use super::FieldErrors;
use serde_json::Value;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_INTEGER: &str = "Enter a whole number.";
pub const INVALID_VALUE: &str = "Enter a valid value.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

pub fn max_length_message(max: usize, len: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        max, len
    )
}

pub fn min_value_message(min: i64) -> String {
    format!("Ensure this value is greater than or equal to {}.", min)
}

pub fn unknown_choice_message(value: &str) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        value
    )
}

fn raw<'a>(data: &'a Value, field: &str) -> Option<&'a Value> {
    match data.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// Scalar to trimmed text; `None` for arrays and objects
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a text field.
///
/// Missing, null and blank values are an error when `required`, otherwise they
/// read as an empty string.
pub fn text(
    data: &Value,
    field: &str,
    required: bool,
    max_length: Option<usize>,
    errors: &mut FieldErrors,
) -> String {
    let value = match raw(data, field) {
        None => String::new(),
        Some(v) => match as_text(v) {
            Some(s) => s,
            None => {
                errors.add(field, INVALID_VALUE);
                return String::new();
            }
        },
    };

    if value.is_empty() {
        if required {
            errors.add(field, REQUIRED);
        }
        return value;
    }

    if let Some(max) = max_length {
        let len = value.chars().count();
        if len > max {
            errors.add(field, max_length_message(max, len));
        }
    }

    value
}

/// Read an optional text field; blank reads as `None`
pub fn optional_text(
    data: &Value,
    field: &str,
    max_length: Option<usize>,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = text(data, field, false, max_length, errors);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Read an integer given either as a JSON number or a numeric string
pub fn integer(
    data: &Value,
    field: &str,
    required: bool,
    min: Option<i64>,
    errors: &mut FieldErrors,
) -> Option<i64> {
    let parsed = match raw(data, field) {
        None => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(i),
            None => {
                errors.add(field, INVALID_INTEGER);
                return None;
            }
        },
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Some(i),
            Err(_) => {
                errors.add(field, INVALID_INTEGER);
                return None;
            }
        },
        Some(_) => {
            errors.add(field, INVALID_INTEGER);
            return None;
        }
    };

    match parsed {
        None => {
            if required {
                errors.add(field, REQUIRED);
            }
            None
        }
        Some(i) => {
            if let Some(min) = min {
                if i < min {
                    errors.add(field, min_value_message(min));
                }
            }
            Some(i)
        }
    }
}

/// Read a checkbox-style flag.
///
/// A missing flag is `false`, the way an unticked checkbox is absent from a
/// submitted form.
pub fn boolean(data: &Value, field: &str) -> bool {
    match raw(data, field) {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            !matches!(s.as_str(), "" | "false" | "0" | "off" | "no")
        }
        Some(_) => true,
    }
}

/// Read a required value restricted to `allowed`
pub fn choice(
    data: &Value,
    field: &str,
    allowed: &[&str],
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = text(data, field, true, None, errors);
    if value.is_empty() || errors.contains(field) {
        return None;
    }

    if allowed.contains(&value.as_str()) {
        Some(value)
    } else {
        errors.add(field, unknown_choice_message(&value));
        None
    }
}

/// Read a list of strings; a missing list is empty
pub fn string_list(data: &Value, field: &str, errors: &mut FieldErrors) -> Vec<String> {
    match raw(data, field) {
        None => Vec::new(),
        Some(Value::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(s) if !s.trim().is_empty() => values.push(s.trim().to_string()),
                    _ => {
                        errors.add(field, INVALID_VALUE);
                        return Vec::new();
                    }
                }
            }
            values
        }
        Some(_) => {
            errors.add(field, INVALID_VALUE);
            Vec::new()
        }
    }
}
