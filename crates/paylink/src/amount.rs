//! Decimal token amounts as typed by people and carried in links.
//!
//! Amounts stay as their decimal string so a link re-encodes exactly what the
//! requester typed. Conversion to on-chain base units is integer-only.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most decimal places a token can declare: `U256::MAX` has 78 digits.
pub const MAX_DECIMALS: u32 = 77;

/// Why a string is not a usable amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be a valid number")]
    NotANumber,

    #[error("Amount must be greater than 0")]
    NotPositive,

    #[error("Amount has more than {0} decimal places")]
    TooPrecise(u32),

    #[error("Token decimals {0} exceed the supported maximum of {MAX_DECIMALS}")]
    UnsupportedDecimals(u32),
}

/// A strictly positive decimal amount, e.g. `"10"` or `"0.5"`.
///
/// Scientific notation is accepted and stored in plain decimal form, so
/// `"1e3"` becomes `"1000"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(String);

impl Amount {
    pub fn parse(raw: &str) -> Result<Self, AmountError> {
        let trimmed = raw.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (mantissa, exponent) = match digits.split_once(|c| c == 'e' || c == 'E') {
            Some((mantissa, exponent)) => (mantissa, Some(parse_exponent(exponent)?)),
            None => (digits, None),
        };

        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let well_formed = !(integer.is_empty() && fraction.is_empty())
            && integer.chars().all(|c| c.is_ascii_digit())
            && fraction.chars().all(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(AmountError::NotANumber);
        }

        let is_zero = integer.chars().chain(fraction.chars()).all(|c| c == '0');
        if negative || is_zero {
            return Err(AmountError::NotPositive);
        }

        match exponent {
            Some(exponent) => Ok(Self(shift_point(integer, fraction, exponent))),
            None => Ok(Self(digits.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to integer base units for a token with `decimals` places.
    ///
    /// `"1.5"` with 6 decimals is `1500000`. Rejects amounts that would need
    /// rounding instead of truncating them.
    pub fn to_base_units(&self, decimals: u32) -> Result<U256, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(decimals));
        }
        let (integer, fraction) = self.0.split_once('.').unwrap_or((&self.0, ""));
        let fraction = fraction.trim_end_matches('0');
        let places = decimals as usize;
        if fraction.len() > places {
            return Err(AmountError::TooPrecise(decimals));
        }

        let mut digits = String::with_capacity(integer.len() + places);
        digits.push_str(integer);
        digits.push_str(fraction);
        digits.extend(std::iter::repeat('0').take(places - fraction.len()));

        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }
        U256::from_str_radix(digits, 10).map_err(|_| AmountError::NotANumber)
    }
}

fn parse_exponent(raw: &str) -> Result<i64, AmountError> {
    let unsigned = raw.strip_prefix(|c| c == '+' || c == '-').unwrap_or(raw);
    if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::NotANumber);
    }
    raw.parse::<i64>()
        .ok()
        .filter(|e| e.unsigned_abs() <= u64::from(MAX_DECIMALS))
        .ok_or(AmountError::NotANumber)
}

/// Plain decimal for `integer.fraction * 10^exponent`, without redundant zeros.
fn shift_point(integer: &str, fraction: &str, exponent: i64) -> String {
    let digits = format!("{integer}{fraction}");
    let point = integer.len() as i64 + exponent;
    let (whole, part) = if point <= 0 {
        let zeros = "0".repeat(point.unsigned_abs() as usize);
        (String::new(), format!("{zeros}{digits}"))
    } else if point as usize >= digits.len() {
        let zeros = "0".repeat(point as usize - digits.len());
        (format!("{digits}{zeros}"), String::new())
    } else {
        let (whole, part) = digits.split_at(point as usize);
        (whole.to_string(), part.to_string())
    };

    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    match part.trim_end_matches('0') {
        "" => whole.to_string(),
        part => format!("{whole}.{part}"),
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::parse(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
