//! Observation — the coarse daily price/volume record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::InstrumentId;

/// One end-of-day price/volume record for one instrument.
///
/// The host delivers a batch of these per cycle covering the full tracked
/// universe, in arbitrary order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: InstrumentId,
    pub timestamp: NaiveDate,
    pub adjusted_price: f64,
    pub dollar_volume: f64,
    pub has_fundamental_data: bool,
}

impl Observation {
    pub fn new(
        id: impl Into<InstrumentId>,
        timestamp: NaiveDate,
        adjusted_price: f64,
        dollar_volume: f64,
        has_fundamental_data: bool,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            adjusted_price,
            dollar_volume,
            has_fundamental_data,
        }
    }

    /// Returns true if price is positive and finite and volume is non-negative and finite.
    pub fn is_sane(&self) -> bool {
        self.adjusted_price.is_finite()
            && self.adjusted_price > 0.0
            && self.dollar_volume.is_finite()
            && self.dollar_volume >= 0.0
    }
}
