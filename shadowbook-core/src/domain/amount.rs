//! Base-unit amounts
//!
//! Balances and nonces are unbounded integers. Display conversion to a
//! decimal string happens here, as does parsing of human-entered amounts.

use num_bigint::{BigInt, BigUint};
use num_traits::Signed;

use super::result::{Error, Result};

/// Default number of fractional digits when formatting balances
pub const DEFAULT_DECIMALS: u32 = 6;

/// Largest display precision accepted from users and settings. A 256-bit
/// integer has 78 digits.
pub const MAX_DECIMALS: u32 = 78;

/// Validate a user-supplied display precision
pub fn check_decimals(decimals: u32) -> Result<u32> {
    if decimals > MAX_DECIMALS {
        return Err(Error::validation(format!(
            "decimals must be at most {}, got {}",
            MAX_DECIMALS, decimals
        )));
    }
    Ok(decimals)
}

/// Format a base-unit amount as a decimal string with exactly `decimals`
/// fractional digits.
///
/// The integer and fractional parts come from truncating division by
/// `10^decimals`. Negative amounts are rendered as a `-` followed by the
/// formatted magnitude, so `-1` with 2 decimals is `-0.01`. With zero
/// decimals only the integer part is returned.
pub fn format_units(value: &BigInt, decimals: u32) -> String {
    let sign = if value.is_negative() { "-" } else { "" };
    let magnitude = value.magnitude();
    if decimals == 0 {
        return format!("{}{}", sign, magnitude);
    }

    let divisor = BigUint::from(10u32).pow(decimals);
    let whole = magnitude / &divisor;
    let fraction = (magnitude % &divisor).to_string();

    format!(
        "{}{}.{:0>width$}",
        sign,
        whole,
        fraction,
        width = decimals as usize
    )
}

/// Parse a human decimal amount (e.g. "100.5") into base units.
///
/// Accepts an optional leading `-` and at most `decimals` fractional digits.
pub fn parse_units(input: &str, decimals: u32) -> Result<BigInt> {
    let trimmed = input.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(Error::validation(format!("invalid amount '{}'", input)));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(Error::validation(format!("invalid amount '{}'", input)));
    }
    if fraction.len() > decimals as usize {
        return Err(Error::validation(format!(
            "amount '{}' has more than {} fractional digits",
            input, decimals
        )));
    }

    let digits = format!(
        "{}{:0<width$}",
        whole,
        fraction,
        width = decimals as usize
    );
    let magnitude: BigInt = digits
        .parse()
        .map_err(|_| Error::validation(format!("invalid amount '{}'", input)))?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse a base-unit integer (e.g. a nonce or a raw amount)
pub fn parse_integer(input: &str) -> Result<BigInt> {
    input
        .trim()
        .parse::<BigInt>()
        .map_err(|_| Error::validation(format!("invalid integer '{}'", input)))
}

/// Serialize a `BigInt` as a decimal string
pub mod serde_bigint {
    use num_bigint::BigInt;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Serialize an `Option<BigInt>` as a nullable decimal string
pub mod serde_bigint_opt {
    use num_bigint::BigInt;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<BigInt>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigInt>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| s.parse().map_err(de::Error::custom)).transpose()
    }
}
