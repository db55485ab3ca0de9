//! Integer parsing policy for counts (quantities and machine minutes).
//!
//! Accepted: JSON numbers that are whole, non-negative and at most
//! [`MAX_COUNT`], and strings that after trimming ASCII whitespace are only
//! decimal digits within the same range. Everything else is rejected; nothing
//! is coerced to zero.

use serde_json::Value;
use thiserror::Error;

/// Largest count a record may hold. Matches the 32-bit signed integer
/// columns of the SQL tables so every accepted count can be stored.
pub const MAX_COUNT: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CountError {
    #[error("is missing")]
    Missing,
    #[error("must be a whole number")]
    NotWholeNumber,
    #[error("must not be negative")]
    Negative,
    #[error("is too large (at most {})", MAX_COUNT)]
    TooLarge,
}

fn within_range(n: u64) -> Result<u32, CountError> {
    u32::try_from(n)
        .ok()
        .filter(|&n| n <= MAX_COUNT)
        .ok_or(CountError::TooLarge)
}

/// Parses user or store text into a count.
pub fn parse_count(text: &str) -> Result<u32, CountError> {
    let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return Err(CountError::Missing);
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CountError::NotWholeNumber);
    }
    if negative {
        return Err(CountError::Negative);
    }

    digits
        .parse::<u64>()
        .map_err(|_| CountError::TooLarge)
        .and_then(within_range)
}

/// Reads a count out of a JSON value as delivered by a record store.
pub fn count_from_json(value: &Value) -> Result<u32, CountError> {
    match value {
        Value::Null => Err(CountError::Missing),
        Value::String(text) => parse_count(text),
        Value::Number(number) => {
            if let Some(n) = number.as_u64() {
                return within_range(n);
            }
            if number.as_i64().is_some() {
                return Err(CountError::Negative);
            }
            match number.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => {
                    if f < 0.0 {
                        Err(CountError::Negative)
                    } else if f > f64::from(MAX_COUNT) {
                        Err(CountError::TooLarge)
                    } else {
                        within_range(f as u64)
                    }
                }
                _ => Err(CountError::NotWholeNumber),
            }
        }
        _ => Err(CountError::NotWholeNumber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_counts() {
        assert_eq!(parse_count("45"), Ok(45));
        assert_eq!(parse_count("  90\t"), Ok(90));
        assert_eq!(parse_count("007"), Ok(7));
        assert_eq!(parse_count(""), Err(CountError::Missing));
        assert_eq!(parse_count("   "), Err(CountError::Missing));
        assert_eq!(parse_count("abc"), Err(CountError::NotWholeNumber));
        assert_eq!(parse_count("12abc"), Err(CountError::NotWholeNumber));
        assert_eq!(parse_count("4.5"), Err(CountError::NotWholeNumber));
        assert_eq!(parse_count("1e3"), Err(CountError::NotWholeNumber));
        assert_eq!(parse_count("+5"), Err(CountError::NotWholeNumber));
        assert_eq!(parse_count("NaN"), Err(CountError::NotWholeNumber));
        assert_eq!(parse_count("-"), Err(CountError::NotWholeNumber));
        assert_eq!(parse_count("-15"), Err(CountError::Negative));
        assert_eq!(parse_count("2147483647"), Ok(MAX_COUNT));
        assert_eq!(parse_count("2147483648"), Err(CountError::TooLarge));
        assert_eq!(parse_count("3000000000"), Err(CountError::TooLarge));
        assert_eq!(parse_count("99999999999999999999999"), Err(CountError::TooLarge));
    }

    #[test]
    fn json_counts() {
        assert_eq!(count_from_json(&json!(60)), Ok(60));
        assert_eq!(count_from_json(&json!(60.0)), Ok(60));
        assert_eq!(count_from_json(&json!("30")), Ok(30));
        assert_eq!(count_from_json(&json!(null)), Err(CountError::Missing));
        assert_eq!(count_from_json(&json!("abc")), Err(CountError::NotWholeNumber));
        assert_eq!(count_from_json(&json!(12.5)), Err(CountError::NotWholeNumber));
        assert_eq!(count_from_json(&json!(-3)), Err(CountError::Negative));
        assert_eq!(count_from_json(&json!(true)), Err(CountError::NotWholeNumber));
        assert_eq!(
            count_from_json(&json!(5_000_000_000u64)),
            Err(CountError::TooLarge)
        );
        assert_eq!(count_from_json(&json!(3_000_000_000u32)), Err(CountError::TooLarge));
        assert_eq!(count_from_json(&json!(3.0e9)), Err(CountError::TooLarge));
        assert_eq!(count_from_json(&json!(2147483647)), Ok(MAX_COUNT));
    }

    #[test]
    fn error_messages_read_as_field_suffixes() {
        assert_eq!(CountError::NotWholeNumber.to_string(), "must be a whole number");
        assert_eq!(CountError::TooLarge.to_string(), "is too large (at most 2147483647)");
    }
}
