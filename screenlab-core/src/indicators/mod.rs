//! Incremental indicator implementations.
//!
//! Unlike batch indicators computed over a full series, these are fed one
//! sample per cycle and keep only the window they need. A value is never
//! exposed before its window has filled.

pub mod indicator_set;
pub mod sma;

pub use indicator_set::{RollingIndicatorSet, SHORT_WINDOW};
pub use sma::RollingSma;

/// Consecutive calendar days starting 2024-01-02, for feeding test series.
#[cfg(test)]
pub fn day(i: usize) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(i as i64)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
