//! Decimal token amounts to provider quantities.

use alloy::primitives::{utils::parse_units, U256};

use crate::error::ClientError;

/// Decimals of the chain's native currency.
pub const NATIVE_DECIMALS: u8 = 18;
/// Gas limit of a plain native-currency transfer.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Converts a decimal amount into integer smallest units (`amount * 10^decimals`).
///
/// The conversion works on the shortest decimal rendering of `amount`, so `0.1`
/// becomes exactly `10^17` rather than the nearest product of two floats.
/// Digits beyond `decimals` are truncated.
pub fn to_base_units(amount: f64, decimals: u8) -> Result<U256, ClientError> {
    if !amount.is_finite() {
        return Err(ClientError::InvalidAmount(format!("{amount} is not finite")));
    }
    if amount < 0.0 {
        return Err(ClientError::InvalidAmount(format!("{amount} is negative")));
    }

    let rendered = amount.to_string();
    let precision = usize::from(decimals);
    let rendered = match rendered.split_once('.') {
        Some((whole, _)) if precision == 0 => whole.to_string(),
        Some((whole, fraction)) if fraction.len() > precision => {
            format!("{whole}.{}", &fraction[..precision])
        }
        _ => rendered.clone(),
    };

    parse_units(&rendered, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| ClientError::InvalidAmount(format!("{amount}: {e}")))
}

/// `0x`-prefixed lowercase hex quantity as providers expect it.
pub fn to_hex_quantity(value: U256) -> String {
    format!("{value:#x}")
}

/// Native transfer value for `amount`, e.g. `0.5` -> `0x6f05b59d3b20000`.
pub fn native_value_hex(amount: f64) -> Result<String, ClientError> {
    to_base_units(amount, NATIVE_DECIMALS).map(to_hex_quantity)
}
