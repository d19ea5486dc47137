//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Helpers for the untyped JSON values stored in rows.
//! CONTEXT: Rows keep whatever the schema, the host or an enrichment lookup
//! put there. These helpers give the rest of the engine one consistent way
//! to read numbers out of them and to turn them into display text.

use serde_json::{Number, Value};

/// Reads a number from a stored value. Numeric strings count; blanks do not.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parses trimmed decimal text. Rejects blanks and non-finite results.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Builds a JSON number, keeping integral values as integers so stored rows
/// read `5` rather than `5.0`. Non-finite input becomes null.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Null and the empty string both mean "no value".
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Formats a number without unnecessary decimal places.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Formats a number with a fixed count of decimals.
pub fn format_fixed(n: f64, decimals: u32) -> String {
    if !n.is_finite() {
        return String::new();
    }
    format!("{:.prec$}", n, prec = decimals as usize)
}

/// The text form of a stored value, as shown in a cell or joined by merges.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        // Asset descriptors show their file name
        Value::Object(obj) => match obj.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => value.to_string(),
        },
        Value::Array(items) => items.iter().map(display_text).collect::<Vec<_>>().join(","),
    }
}
