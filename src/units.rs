//! Fixed-point conversions between raw integer amounts and human units.

use crate::error::{Error, Result};
use alloy::primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const ETHER_DECIMALS: u8 = 18;
pub const GWEI_DECIMALS: u8 = 9;

/// Formats a raw base-10 integer string as a decimal with `decimals` places,
/// dropping trailing zeros. `"1000000000000000000"` at 18 decimals is `"1"`.
pub fn format_units(raw: &str, decimals: u8) -> Result<String> {
    let value = U256::from_str_radix(raw.trim(), 10)
        .map_err(|e| Error::malformed("explorer", format!("invalid amount {:?}: {}", raw, e)))?;
    Ok(format_u256(value, decimals))
}

pub fn format_u256(value: U256, decimals: u8) -> String {
    let scale = pow10(decimals);
    let whole = value / scale;
    let fraction = value % scale;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

pub fn format_ether(value: U256) -> String {
    format_u256(value, ETHER_DECIMALS)
}

pub fn format_gwei(value: U256) -> String {
    format_u256(value, GWEI_DECIMALS)
}

/// Parses a human amount such as `"0.1"` into base units.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let parsed = Decimal::from_str(amount.trim())
        .map_err(|e| Error::invalid_arguments("amount", format!("{:?}: {}", amount, e)))?;

    if parsed.is_sign_negative() {
        return Err(Error::invalid_arguments("amount", "amount must not be negative"));
    }

    let parsed = parsed.normalize();
    let scale = parsed.scale();
    if scale > u32::from(decimals) {
        return Err(Error::invalid_arguments(
            "amount",
            format!("{} has more than {} decimal places", amount, decimals),
        ));
    }

    let mantissa = U256::from(parsed.mantissa().unsigned_abs());
    Ok(mantissa * pow10(decimals - scale as u8))
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}
