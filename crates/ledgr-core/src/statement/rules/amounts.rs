//! Amount parsing for statement figures.

use serde_json::Value;

use super::locale::normalize_digits;
use super::patterns::AMOUNT_VALUE;
use crate::error::FieldError;

/// Parse a raw amount string.
///
/// Thousands separators (`,`, spaces, no-break spaces, Arabic `٬`) are
/// stripped and Arabic-Indic digits mapped to ASCII before the first signed
/// decimal is taken. Currency text around the number is ignored.
pub fn parse_amount_outcome(raw: &str) -> Result<f64, FieldError> {
    let cleaned: String = normalize_digits(raw)
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{00a0}' | '\u{202f}'))
        .collect();

    AMOUNT_VALUE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError::UnparsedAmount {
            raw: raw.to_string(),
        })
}

/// Parse a raw amount, substituting 0.0 for anything non-numeric.
pub fn parse_amount(raw: &str) -> f64 {
    parse_amount_outcome(raw).unwrap_or(0.0)
}

/// Parse a JSON amount value. Numbers are taken as-is; strings go through
/// [`parse_amount_outcome`]. An empty string or null means "no value".
pub fn amount_from_value(value: &Value) -> Option<Result<f64, FieldError>> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
            FieldError::UnparsedAmount {
                raw: n.to_string(),
            }
        })),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(parse_amount_outcome(s)),
        other => Some(Err(FieldError::UnparsedAmount {
            raw: other.to_string(),
        })),
    }
}
