//! Lenient scalar extraction from loosely typed vendor JSON.
//!
//! Vendor feeds mix numbers and numeric strings for the same field; these
//! helpers accept either and treat anything else as absent.

use serde_json::Value;

pub fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

pub fn as_i64(value: Option<&Value>) -> Option<i64> {
    let v = as_f64(value)?;
    (v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64).then_some(v as i64)
}

/// Positive whole number, e.g. a capacity or duration.
pub fn as_positive_u32(value: Option<&Value>) -> Option<u32> {
    as_i64(value).and_then(|v| u32::try_from(v).ok()).filter(|v| *v > 0)
}

pub fn as_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Non-empty trimmed text; numbers are rendered as text.
pub fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier as a string; numbers are rendered without a fraction.
pub fn as_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(
            n.as_i64()
                .map(|i| i.to_string())
                .unwrap_or_else(|| n.to_string()),
        ),
        _ => None,
    }
}
