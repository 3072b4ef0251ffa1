//! Helpers to parse the ASCII responses of SCPI instruments.

use std::str::FromStr;

use crate::InstrumentError;

/// Parse a response into a float, e.g., `"+1.23450000E-01"`.
pub fn parse_f64(response: &str) -> Result<f64, InstrumentError> {
    response
        .trim()
        .parse::<f64>()
        .map_err(|_| InstrumentError::ResponseParseError(response.to_string()))
}

/// Parse a response into an integer.
///
/// Some instruments report integer settings in float notation, e.g., `"+1.00000000E+00"`, so
/// whole floats are accepted as well.
pub fn parse_int(response: &str) -> Result<i64, InstrumentError> {
    let trimmed = response.trim();
    if let Ok(val) = trimmed.parse::<i64>() {
        return Ok(val);
    }
    match trimmed.parse::<f64>() {
        Ok(val) if val.fract() == 0.0 && val.abs() < i64::MAX as f64 => Ok(val as i64),
        _ => Err(InstrumentError::ResponseParseError(response.to_string())),
    }
}

/// Parse a boolean response. `1` and `ON` are true, `0` and `OFF` are false.
pub fn parse_bool(response: &str) -> Result<bool, InstrumentError> {
    let trimmed = response.trim();
    if trimmed.eq_ignore_ascii_case("ON") {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("OFF") {
        return Ok(false);
    }
    match parse_int(trimmed) {
        Ok(1) => Ok(true),
        Ok(0) => Ok(false),
        _ => Err(InstrumentError::ResponseParseError(response.to_string())),
    }
}

/// Parse a comma separated list of values.
///
/// Channel lists such as `"(@1,2,3)"` are accepted, the surrounding `(@` and `)` are dropped.
/// An empty response yields an empty list.
pub fn parse_list<T: FromStr>(response: &str) -> Result<Vec<T>, InstrumentError> {
    let mut trimmed = response.trim();
    if let Some(inner) = trimmed.strip_prefix("(@") {
        trimmed = inner.strip_suffix(')').unwrap_or(inner);
    } else if let Some(inner) = trimmed.strip_prefix('@') {
        trimmed = inner;
    }
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(',')
        .map(|val| {
            val.trim()
                .parse::<T>()
                .map_err(|_| InstrumentError::ResponseParseError(response.to_string()))
        })
        .collect()
}
