//! Decimal parsing for weights and thresholds
//!
//! Weights arrive as decimal strings and are kept in normalized form, so
//! `"1.50"` and `"1.5"` store identically. `Decimal` holds 28 significant
//! digits; inputs and sums that do not fit exactly are rejected rather than
//! rounded.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{GovError, GovResult};

fn invalid(value: &str, reason: &str) -> GovError {
    GovError::InvalidDecimal {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Plain `[-+]digits[.digits]` rendered without redundant zeros
fn canonical_digits(value: &str) -> Option<String> {
    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int.is_empty() && frac.is_empty()) || !is_digits(int) || !is_digits(frac) {
        return None;
    }

    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    let mut out = String::new();
    if negative && !(int.is_empty() && frac.is_empty()) {
        out.push('-');
    }
    out.push_str(if int.is_empty() { "0" } else { int });
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

fn parse(value: &str) -> GovResult<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed != value {
        return Err(invalid(value, "empty or padded"));
    }
    let expected = canonical_digits(value).ok_or_else(|| invalid(value, "not a plain decimal"))?;
    let d = Decimal::from_str(value)
        .map(|d| d.normalize())
        .map_err(|e| invalid(value, &e.to_string()))?;
    if d.to_string() != expected {
        return Err(invalid(value, "more precision than 28 significant digits"));
    }
    Ok(d)
}

/// Parse a decimal that must be `>= 0`
pub fn parse_non_negative(value: &str) -> GovResult<Decimal> {
    let d = parse(value)?;
    if d.is_sign_negative() && !d.is_zero() {
        return Err(GovError::InvalidDecimal {
            value: value.to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    Ok(d.abs())
}

/// Parse a decimal that must be `> 0`
pub fn parse_positive(value: &str) -> GovResult<Decimal> {
    let d = parse_non_negative(value)?;
    if d.is_zero() {
        return Err(GovError::InvalidDecimal {
            value: value.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(d)
}

/// `a + b` or `a - b` computed on the raw mantissas
///
/// `None` when the true result has no `Decimal` representation.
fn exact_combine(a: Decimal, b: Decimal, subtract: bool) -> Option<Decimal> {
    let mut scale = a.scale().max(b.scale());
    let lift = |d: Decimal| {
        10i128
            .checked_pow(scale - d.scale())
            .and_then(|f| d.mantissa().checked_mul(f))
    };
    let lhs = lift(a)?;
    let mut rhs = lift(b)?;
    if subtract {
        rhs = rhs.checked_neg()?;
    }
    let mut sum = lhs.checked_add(rhs)?;
    while scale > 0 && sum % 10 == 0 {
        sum /= 10;
        scale -= 1;
    }
    Decimal::try_from_i128_with_scale(sum, scale).ok()
}

/// Exact addition keeping the result normalized
pub fn checked_add(a: Decimal, b: Decimal) -> GovResult<Decimal> {
    exact_combine(a, b, false)
        .ok_or_else(|| invalid(&format!("{} + {}", a, b), "sum is not exactly representable"))
}

/// Exact subtraction, negative results allowed
pub fn checked_difference(a: Decimal, b: Decimal) -> GovResult<Decimal> {
    exact_combine(a, b, true).ok_or_else(|| {
        invalid(&format!("{} - {}", a, b), "difference is not exactly representable")
    })
}

/// Exact subtraction that refuses to go below zero
pub fn checked_sub(a: Decimal, b: Decimal) -> GovResult<Decimal> {
    let r = checked_difference(a, b)?;
    if r.is_sign_negative() && !r.is_zero() {
        return Err(GovError::Internal(format!(
            "decimal underflow: {} - {} is negative",
            a, b
        )));
    }
    Ok(r)
}
