//! Parsing, validating and formatting note amounts.
//!
//! Amounts are decimals with at most two decimal places. The database stores
//! them as whole kopecks so that sums are exact.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::{FieldErrors, validation::REQUIRED_MESSAGE};

const FIELD: &str = "amount";

/// The most digits an amount may have.
const MAX_DIGITS: u32 = 12;

/// The most digits an amount may have after the decimal point.
const DECIMAL_PLACES: u32 = 2;

const INVALID_MESSAGE: &str = "A valid number is required.";

/// Validate the amount of a note.
///
/// `current` is the stored amount used by partial updates when `raw` is absent.
pub fn validate_amount(
    raw: Option<&Value>,
    current: Option<Decimal>,
    errors: &mut FieldErrors,
) -> Option<Decimal> {
    let Some(raw) = raw else {
        if current.is_none() {
            errors.add(FIELD, REQUIRED_MESSAGE);
        }
        return current;
    };

    match parse_amount(raw) {
        Ok(amount) => Some(amount),
        Err(message) => {
            errors.add(FIELD, &message);
            None
        }
    }
}

fn parse_amount(raw: &Value) -> Result<Decimal, String> {
    let text = match raw {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_owned(),
        _ => return Err(INVALID_MESSAGE.to_owned()),
    };

    let amount = Decimal::from_str(&text)
        .map_err(|_| INVALID_MESSAGE.to_owned())?
        .normalize();

    let decimal_places = amount.scale();
    let whole_digits = digit_count(amount.trunc().abs().mantissa());
    let max_whole_digits = MAX_DIGITS - DECIMAL_PLACES;

    if whole_digits + decimal_places > MAX_DIGITS {
        Err(format!(
            "Ensure that there are no more than {MAX_DIGITS} digits in total."
        ))
    } else if decimal_places > DECIMAL_PLACES {
        Err(format!(
            "Ensure that there are no more than {DECIMAL_PLACES} decimal places."
        ))
    } else if whole_digits > max_whole_digits {
        Err(format!(
            "Ensure that there are no more than {max_whole_digits} digits before the decimal point."
        ))
    } else if amount < Decimal::new(1, DECIMAL_PLACES) {
        Err("Ensure this value is greater than or equal to 0.01.".to_owned())
    } else {
        Ok(amount)
    }
}

fn digit_count(value: i128) -> u32 {
    if value == 0 { 0 } else { value.ilog10() + 1 }
}

/// Convert a validated amount to kopecks.
pub fn to_minor_units(mut amount: Decimal) -> i64 {
    amount.rescale(DECIMAL_PLACES);

    // Validated amounts have at most 12 digits, which always fits.
    i64::try_from(amount.mantissa()).unwrap_or(i64::MAX)
}

/// Convert kopecks to an amount with two decimal places.
pub fn from_minor_units(kopecks: i64) -> Decimal {
    Decimal::new(kopecks, DECIMAL_PLACES)
}

/// Format `amount` with two decimals, spaces between thousands and a decimal comma.
///
/// For example, 1234567.5 is formatted as "1 234 567,50".
pub fn format_amount(mut amount: Decimal) -> String {
    amount.rescale(DECIMAL_PLACES);

    let text = amount.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };

    format!("{sign}{grouped},{fraction}")
}
