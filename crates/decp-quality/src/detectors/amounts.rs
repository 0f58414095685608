//! Amount plausibility and amount/duration coherence.

use crate::config::AmountBounds;

/// Durations (in months) that are really day counts typed in the wrong field.
const DAY_COUNT_DURATIONS: [f64; 3] = [360.0, 365.0, 366.0];

/// An amount outside the open interval `(bounds.lower, bounds.upper)`.
pub fn is_amount_abnormal(amount: f64, bounds: &AmountBounds) -> bool {
    !(bounds.lower < amount && amount < bounds.upper)
}

/// Amount and duration that cannot both be right.
///
/// Flags a duration equal to the amount, a monthly amount below 100 €,
/// a monthly amount below 1 000 € on contracts under 200 000 €, a duration
/// that looks like a day count on contracts under 10 M€, and durations over
/// ten years on contracts under 2 M€.
pub fn are_amount_and_duration_inconsistent(amount: f64, duration_months: f64) -> bool {
    let monthly = amount / duration_months.max(1.0);
    duration_months == amount
        || monthly < 100.0
        || (monthly < 1_000.0 && amount < 200_000.0)
        || (DAY_COUNT_DURATIONS.contains(&duration_months) && amount < 10_000_000.0)
        || (duration_months > 120.0 && amount < 2_000_000.0)
}
