//! Shared numeric helpers.
//!
//! Every stored figure goes through [`round_to`], so artifacts produced by
//! different runs compare digit for digit.

/// Number of decimals kept for rates and dimension values.
pub const RATE_DECIMALS: usize = 2;

/// Number of decimals kept for the overall (general) value.
pub const GENERAL_DECIMALS: usize = 6;

/// Round `value` to `decimals` digits.
///
/// Rounding is done on the exact decimal expansion of the float with ties
/// going to the even digit, so `2.675` (stored as 2.67499...) gives `2.67`.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value)
        .parse::<f64>()
        .unwrap_or(value)
}

/// Divide two counts and round the quotient to two decimals.
///
/// Callers guarantee a non-zero divisor; empty sources never reach here.
pub fn divide_and_round(dividend: f64, divisor: f64) -> f64 {
    round_to(dividend / divisor, RATE_DECIMALS)
}

/// Convert a raw defect count into a rate over `num_records`.
pub fn rate(count: usize, num_records: usize) -> f64 {
    divide_and_round(count as f64, num_records as f64)
}

/// Mean of `values`, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
