//! Per-instrument trend state: a long and a short SMA plus two regime flags.
//!
//! The flags only move once their average is ready. Before that they keep
//! their previous value, which starts out false.

use chrono::NaiveDate;
use tracing::debug;

use super::sma::RollingSma;

/// Fixed short-window length.
pub const SHORT_WINDOW: usize = 5;

#[derive(Debug, Clone)]
pub struct RollingIndicatorSet {
    long: RollingSma,
    short: RollingSma,
    is_above_long_avg: bool,
    is_below_short_avg: bool,
    last_timestamp: Option<NaiveDate>,
}

impl RollingIndicatorSet {
    pub fn new(long_window: usize, short_window: usize) -> Self {
        Self {
            long: RollingSma::new(long_window),
            short: RollingSma::new(short_window),
            is_above_long_avg: false,
            is_below_short_avg: false,
            last_timestamp: None,
        }
    }

    /// Feed one end-of-day price. Timestamps must be non-decreasing.
    ///
    /// Non-finite prices are skipped without touching any state.
    pub fn update(&mut self, timestamp: NaiveDate, price: f64) {
        if !price.is_finite() {
            debug!(%timestamp, price, "skipping non-finite price");
            return;
        }
        self.last_timestamp = Some(timestamp);

        if self.long.update(price) {
            if let Some(avg) = self.long.value() {
                self.is_above_long_avg = price > avg;
            }
        }
        if self.short.update(price) {
            if let Some(avg) = self.short.value() {
                self.is_below_short_avg = price < avg;
            }
        }
    }

    /// Price closed above the long average on the last ready update.
    pub fn is_above_long_avg(&self) -> bool {
        self.is_above_long_avg
    }

    /// Price closed below the short average on the last ready update.
    pub fn is_below_short_avg(&self) -> bool {
        self.is_below_short_avg
    }

    /// Long-term uptrend with a short-term pullback.
    pub fn is_trend_qualified(&self) -> bool {
        self.is_above_long_avg && self.is_below_short_avg
    }

    pub fn long_average(&self) -> Option<f64> {
        self.long.value()
    }

    pub fn short_average(&self) -> Option<f64> {
        self.short.value()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.last_timestamp
    }

    pub fn samples(&self) -> u64 {
        self.long.samples()
    }
}
