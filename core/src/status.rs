//! Status code coercion and reason phrases.

use serde_json::Value;

/// Highest status code an adapter stores; larger inputs saturate here.
pub const MAX_STATUS: u16 = 999;

pub const DEFAULT_STATUS: u16 = 200;

/// Coerce any integer into a storable status: absolute value, saturating at
/// [`MAX_STATUS`].
pub fn coerce(raw: i64) -> u16 {
    let code = u16::try_from(raw.unsigned_abs())
        .unwrap_or(MAX_STATUS)
        .min(MAX_STATUS);
    if i64::from(code) != raw {
        log::warn!("status {raw} coerced to {code}");
    }
    code
}

/// Coerce a native JSON status. Numeric strings are parsed, floats are
/// truncated and anything else becomes 0.
pub fn coerce_value(raw: &Value) -> u16 {
    let number = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    match number {
        Some(n) => coerce(n),
        None => {
            log::warn!("non-numeric status {raw} coerced to 0");
            0
        }
    }
}

/// The standard reason phrase for `code`, or an empty string for codes
/// without one.
pub fn canonical_reason(code: u16) -> &'static str {
    http::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}
