//! Parsing of money amounts sent by clients.
//!
//! Clients may send an amount either as a JSON number or as a string holding a
//! number, e.g. the value of a form input.

use serde_json::Value;

use crate::Error;

/// Parse `value` as an amount of money.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `value` is not a number or numeric string,
/// or if the number is negative, NaN or infinite.
pub fn parse_amount(value: &Value) -> Result<f64, Error> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match amount {
        Some(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount(display_value(value))),
    }
}

/// Parse an optional `value` as an amount of money, treating a missing value
/// as a missing field.
///
/// # Errors
///
/// Returns [Error::MissingFields] if `value` is `None` or JSON `null`,
/// otherwise the errors from [parse_amount].
pub fn parse_required_amount(value: Option<&Value>) -> Result<f64, Error> {
    match value {
        None | Some(Value::Null) => Err(Error::MissingFields),
        Some(value) => parse_amount(value),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
