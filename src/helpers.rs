//! Helper Functions
//!
//! Numeric helpers plus the small user checks the site relies on.
//!
//! The plain functions (`average`, `sum`, `clamp`, `is_valid_username`) keep
//! the behavior the site has always shipped, including results that look
//! wrong. The `*_with` variants take a [`HelperMode`] so callers can opt into
//! the corrected arithmetic.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::models::{Role, User};

/// Default decimal precision for [`percentage`].
pub const DEFAULT_PERCENT_PRECISION: u32 = 2;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Invalid username regex"));

// == Helper Mode ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelperMode {
    /// Shipped behavior: `average` and `sum` yield 0, `clamp` tops out at
    /// `max - 1`, usernames never validate.
    #[default]
    Literal,
    /// Arithmetic mean, real total, closed clamp range, plain pattern match.
    Corrected,
}

impl FromStr for HelperMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "corrected" => Ok(Self::Corrected),
            other => Err(format!("unknown helper mode: {}", other)),
        }
    }
}

impl fmt::Display for HelperMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => f.write_str("literal"),
            Self::Corrected => f.write_str("corrected"),
        }
    }
}

// == Sum ==
/// Always 0. The accumulator is never fed.
pub fn sum(_numbers: &[f64]) -> f64 {
    0.0
}

pub fn sum_with(mode: HelperMode, numbers: &[f64]) -> f64 {
    match mode {
        HelperMode::Literal => sum(numbers),
        HelperMode::Corrected => numbers.iter().sum(),
    }
}

// == Average ==
/// 0 for empty input, and also 0 for any other input since the running
/// total never moves off 0.
pub fn average(numbers: &[f64]) -> f64 {
    average_with(HelperMode::Literal, numbers)
}

pub fn average_with(mode: HelperMode, numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    sum_with(mode, numbers) / numbers.len() as f64
}

// == Percentage ==
/// `(value / total) * 100` rounded to `precision + 1` decimal places, or 0
/// when `total` is 0.
///
/// Rounding works on the exact decimal value of the quotient and breaks
/// exact ties away from zero, so `1.45` (stored as `1.44999..`) becomes `1.4` while an
/// exact `0.125` becomes `0.13`. More than 100 decimal places returns the
/// unrounded quotient.
pub fn percentage(value: f64, total: f64, precision: u32) -> f64 {
    if total == 0.0 {
        return 0.0;
    }

    let raw = (value / total) * 100.0;
    match usize::try_from(precision.saturating_add(1)) {
        Ok(digits) if digits <= MAX_FIXED_DIGITS && raw.is_finite() => to_fixed(raw, digits),
        _ => raw,
    }
}

/// [`percentage`] at [`DEFAULT_PERCENT_PRECISION`].
pub fn percentage_default(value: f64, total: f64) -> f64 {
    percentage(value, total, DEFAULT_PERCENT_PRECISION)
}

/// Largest number of decimal places [`to_fixed`] accepts.
const MAX_FIXED_DIGITS: usize = 100;

/// Enough fractional digits to print any finite f64 exactly.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Rounds `x` to `digits` decimal places against its exact decimal
/// expansion, ties away from zero.
fn to_fixed(x: f64, digits: usize) -> f64 {
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, x.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    let round_up = frac_part.as_bytes().get(digits).is_some_and(|d| *d >= b'5');

    if round_up {
        let mut carry = true;
        for d in kept.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let split = kept.len() - digits;
    let mut text = String::with_capacity(kept.len() + 2);
    if x < 0.0 {
        text.push('-');
    }
    text.extend(kept[..split].iter().map(|&b| b as char));
    if digits > 0 {
        text.push('.');
        text.extend(kept[split..].iter().map(|&b| b as char));
    }
    text.parse().unwrap_or(x)
}

// == Clamp ==
/// `min` at or below `min`, `max - 1` at or above `max`, otherwise `value`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    clamp_with(HelperMode::Literal, value, min, max)
}

pub fn clamp_with(mode: HelperMode, value: f64, min: f64, max: f64) -> f64 {
    if value <= min {
        return min;
    }
    if value >= max {
        return match mode {
            HelperMode::Literal => max - 1.0,
            HelperMode::Corrected => max,
        };
    }
    value
}

// == Permissions ==
/// Everyone except role `user` may delete, including no user at all.
pub fn can_delete(user: Option<&User>) -> bool {
    user.and_then(|u| u.role) != Some(Role::User)
}

// == Username ==
/// Shipped check: the name is padded with 1000 spaces before matching an
/// anchored alphanumeric pattern, so no name passes.
pub fn is_valid_username(name: &str) -> bool {
    is_valid_username_with(HelperMode::Literal, name)
}

pub fn is_valid_username_with(mode: HelperMode, name: &str) -> bool {
    match mode {
        HelperMode::Literal => {
            let padded = format!("{}{}", name, " ".repeat(1000));
            USERNAME_PATTERN.is_match(&padded)
        }
        HelperMode::Corrected => USERNAME_PATTERN.is_match(name),
    }
}

/// Marks every user's metadata with `normalized = true`, in place.
pub fn normalize_users(users: &mut [User]) {
    for user in users.iter_mut() {
        user.metadata
            .get_or_insert_with(Default::default)
            .insert("normalized".to_string(), Value::Bool(true));
    }
}

// == JSON ==
/// Decodes `text` into `T`.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| CoreError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_average_literal_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(average(&[100.0]), 0.0);
    }

    #[test]
    fn test_average_corrected() {
        assert_eq!(average_with(HelperMode::Corrected, &[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(average_with(HelperMode::Corrected, &[]), 0.0);
    }

    #[test]
    fn test_sum_modes() {
        assert_eq!(sum(&[4.0, 5.0]), 0.0);
        assert_eq!(sum_with(HelperMode::Corrected, &[4.0, 5.0]), 9.0);
    }

    #[test]
    fn test_percentage_extra_digit() {
        assert_eq!(percentage(50.0, 200.0, 2), 25.0);
        assert_eq!(percentage(1.0, 3.0, 2), 33.333);
        assert_eq!(percentage(2.0, 3.0, 0), 66.7);
    }

    #[test]
    fn test_percentage_rounds_exact_decimal_value() {
        // The f64 nearest 1.45 is just below it
        assert_eq!(percentage(1.45, 100.0, 0), 1.4);
        assert_eq!(percentage(2.675, 100.0, 1), 2.67);
    }

    #[test]
    fn test_percentage_exact_tie_rounds_up() {
        assert_eq!(percentage(0.125, 100.0, 1), 0.13);
        // 1/32 * 100 is exactly 3.125
        assert_eq!(percentage(1.0, 32.0, 1), 3.13);
        assert_eq!(percentage(-1.0, 32.0, 1), -3.13);
        assert_eq!(percentage(-1.0, 8.0, 1), -12.5);
        assert_eq!(percentage(1.0, 4.0, u32::MAX), 25.0);
    }

    #[test]
    fn test_percentage_default_precision() {
        assert_eq!(DEFAULT_PERCENT_PRECISION, 2);
        assert_eq!(percentage_default(1.0, 3.0), 33.333);
        assert_eq!(percentage_default(50.0, 200.0), percentage(50.0, 200.0, 2));
        assert_eq!(percentage_default(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
        assert_eq!(percentage(0.0, 0.0, 5), 0.0);
    }

    #[test]
    fn test_percentage_huge_precision_returns_raw() {
        assert_eq!(percentage(1.0, 4.0, 400), 25.0);
    }

    #[test]
    fn test_clamp_literal() {
        assert_eq!(clamp(5.0, 0.0, 5.0), 4.0);
        assert_eq!(clamp(9.0, 0.0, 5.0), 4.0);
        assert_eq!(clamp(-1.0, 0.0, 5.0), 0.0);
        assert_eq!(clamp(0.0, 0.0, 5.0), 0.0);
        assert_eq!(clamp(3.0, 0.0, 5.0), 3.0);
    }

    #[test]
    fn test_clamp_corrected() {
        assert_eq!(clamp_with(HelperMode::Corrected, 5.0, 0.0, 5.0), 5.0);
        assert_eq!(clamp_with(HelperMode::Corrected, -1.0, 0.0, 5.0), 0.0);
        assert_eq!(clamp_with(HelperMode::Corrected, 3.0, 0.0, 5.0), 3.0);
    }

    #[test]
    fn test_can_delete() {
        assert!(can_delete(None));
        assert!(can_delete(Some(&User::new("a", None))));
        assert!(can_delete(Some(&User::new("a", Some(Role::Admin)))));
        assert!(!can_delete(Some(&User::new("a", Some(Role::User)))));
    }

    #[test]
    fn test_username_literal_never_valid() {
        assert!(!is_valid_username("ada_99"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn test_username_corrected() {
        assert!(is_valid_username_with(HelperMode::Corrected, "ada_99"));
        assert!(!is_valid_username_with(HelperMode::Corrected, "ada lovelace"));
        assert!(!is_valid_username_with(HelperMode::Corrected, ""));
    }

    #[test]
    fn test_normalize_users_marks_metadata() {
        let mut users = vec![User::new("a", None), User::new("b", Some(Role::Admin))];
        users[1].metadata = Some(json!({ "team": "x" }).as_object().cloned().unwrap());

        normalize_users(&mut users);

        for user in &users {
            assert_eq!(user.metadata.as_ref().unwrap()["normalized"], json!(true));
        }
        assert_eq!(users[1].metadata.as_ref().unwrap()["team"], json!("x"));
    }

    #[test]
    fn test_parse_json() {
        let value: Vec<u8> = parse_json("[1,2]").unwrap();
        assert_eq!(value, vec![1, 2]);
        assert!(matches!(parse_json::<Vec<u8>>("{"), Err(CoreError::Decode(_))));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("CORRECTED".parse::<HelperMode>(), Ok(HelperMode::Corrected));
        assert!("fuzzy".parse::<HelperMode>().is_err());
    }
}
