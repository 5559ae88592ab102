//! Simple Moving Average (SMA), maintained incrementally.
//!
//! Rolling mean of the last `period` samples. Ready once `period` samples
//! have been consumed; no value is exposed before that.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingSma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    samples: u64,
}

impl RollingSma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
            samples: 0,
        }
    }

    /// Total samples consumed since construction.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }

    /// Push one sample. Returns whether the average is ready afterwards.
    ///
    /// Callers must only pass finite values.
    pub fn update(&mut self, value: f64) -> bool {
        if self.window.len() == self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
            }
        }
        self.window.push_back(value);
        self.sum += value;
        self.samples += 1;

        // Re-sum once per full window turn so rounding error cannot accumulate.
        if self.samples % self.period as u64 == 0 {
            self.sum = self.window.iter().sum();
        }

        self.is_ready()
    }

    /// Current mean, or `None` before the window is full.
    pub fn value(&self) -> Option<f64> {
        if self.is_ready() {
            Some(self.sum / self.period as f64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn feed(sma: &mut RollingSma, values: &[f64]) -> Vec<Option<f64>> {
        values
            .iter()
            .map(|&v| {
                sma.update(v);
                sma.value()
            })
            .collect()
    }

    #[test]
    fn sma_5_basic() {
        let mut sma = RollingSma::new(5);
        let result = feed(&mut sma, &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);

        for (i, value) in result.iter().enumerate().take(4) {
            assert!(value.is_none(), "expected no value at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4].unwrap(), 12.0, DEFAULT_EPSILON);
        // SMA[5] = mean(11,12,13,14,15) = 13.0
        assert_approx(result[5].unwrap(), 13.0, DEFAULT_EPSILON);
        // SMA[6] = mean(12,13,14,15,16) = 14.0
        assert_approx(result[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_last_sample() {
        let mut sma = RollingSma::new(1);
        let result = feed(&mut sma, &[100.0, 200.0, 300.0]);
        assert_approx(result[0].unwrap(), 100.0, DEFAULT_EPSILON);
        assert_approx(result[1].unwrap(), 200.0, DEFAULT_EPSILON);
        assert_approx(result[2].unwrap(), 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn update_reports_readiness() {
        let mut sma = RollingSma::new(3);
        assert!(!sma.update(1.0));
        assert!(!sma.update(2.0));
        assert!(sma.update(3.0));
        assert!(sma.update(4.0));
        assert_eq!(sma.samples(), 4);
    }

    #[test]
    fn too_few_samples_has_no_value() {
        let mut sma = RollingSma::new(5);
        feed(&mut sma, &[10.0, 11.0]);
        assert!(!sma.is_ready());
        assert_eq!(sma.value(), None);
    }

    #[test]
    fn long_run_does_not_drift() {
        let mut sma = RollingSma::new(200);
        for i in 0..100_000 {
            sma.update(100.0 + (i as f64 * 0.37).sin() * 0.1);
        }
        for _ in 0..200 {
            sma.update(42.5);
        }
        assert_approx(sma.value().unwrap(), 42.5, 1e-9);
    }
}
