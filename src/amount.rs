//! Exact fixed-point rendering of ledger amounts.
//!
//! Amounts are integers in the smallest unit of a token; a token's
//! `decimals` says where the decimal point goes. Formatting never touches
//! floating point and never trims trailing zeros, so `1.00000000 ZNN` and
//! `1.00 XYZ` stay distinguishable.

use num_bigint::BigUint;

pub const ZNN_DECIMALS: u8 = 8;
pub const QSR_DECIMALS: u8 = 8;

/// Render `amount / 10^decimals` with exactly `decimals` fractional digits.
pub fn format_amount(amount: &BigUint, decimals: u8) -> String {
    let digits = amount.to_str_radix(10);
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    // Left-pad so there is at least one integer digit.
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let split = padded.len() - decimals;
    format!("{}.{}", &padded[..split], &padded[split..])
}
