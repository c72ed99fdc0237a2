//! Monetary amount normalization.
//!
//! Rounding works on the literal's digit string, so any number of input
//! digits is exact and ties round the same way every time. The rounded value
//! is then held as a `Decimal` with two fraction digits.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// A single numeric literal: sign, digits with at most one point, optional exponent.
static AMOUNT_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<sign>[+-]?)(?:(?P<int>[0-9]+)(?:\.(?P<frac>[0-9]*))?|\.(?P<bare>[0-9]+))(?:[eE](?P<exp>[+-]?[0-9]+))?$",
    )
    .expect("Invalid amount literal regex")
});

/// Significant digits a normalized amount may carry, cents included.
pub const MAX_AMOUNT_DIGITS: usize = 28;

/// Normalize an amount to a fixed-point string with exactly two fraction digits.
///
/// Commas are read as decimal points (`1,20` is `1.20`). Rounding is half
/// away from zero (`100.565` to `100.57`, `-999.999` to `-1000.00`) and a zero
/// result is always `0.00`, never `-0.00`.
///
/// Returns `None` for empty input, anything that is not exactly one numeric
/// literal (currency symbols, letters, thousands separators, more than one
/// decimal point), and results with more than [`MAX_AMOUNT_DIGITS`]
/// significant digits.
pub fn normalize_amount(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let literal = trimmed.replace(',', ".");
    let cents = round_to_cents(&literal)?;
    if cents.is_zero() {
        return Some("0.00".to_string());
    }
    Some(format!("{cents:.2}"))
}

/// Parse `literal` and round it to two fraction digits, half away from zero.
fn round_to_cents(literal: &str) -> Option<Decimal> {
    let caps = AMOUNT_LITERAL.captures(literal)?;
    let negative = &caps["sign"] == "-";
    let int = caps.name("int").map_or("", |m| m.as_str());
    let frac = caps
        .name("frac")
        .or_else(|| caps.name("bare"))
        .map_or("", |m| m.as_str());
    let exponent: i64 = match caps.name("exp") {
        Some(exp) => exp.as_str().parse().ok()?,
        None => 0,
    };

    // value = 0.<digits> * 10^point once leading zeros are gone
    let all_digits = format!("{int}{frac}");
    let digits = all_digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(Decimal::ZERO);
    }
    let leading_zeros = (all_digits.len() - digits.len()) as i64;
    let point = (int.len() as i64)
        .checked_add(exponent)?
        .checked_sub(leading_zeros)?;

    // digits that land at or above the hundredths place
    let kept = point.checked_add(2)?;
    if kept > MAX_AMOUNT_DIGITS as i64 + 1 {
        return None;
    }
    let (mut cents, round_digit) = if kept < 0 {
        (0u128, 0)
    } else {
        let kept = kept as usize;
        let mut cents = 0u128;
        for index in 0..kept {
            let digit = digits.as_bytes().get(index).map_or(0, |b| b - b'0');
            cents = cents * 10 + u128::from(digit);
        }
        let round_digit = digits.as_bytes().get(kept).map_or(0, |b| b - b'0');
        (cents, round_digit)
    };
    if round_digit >= 5 {
        cents += 1;
    }
    if cents >= 10u128.pow(MAX_AMOUNT_DIGITS as u32) {
        return None;
    }
    let signed = i128::try_from(cents).ok()?;
    Decimal::try_from_i128_with_scale(if negative { -signed } else { signed }, 2).ok()
}
