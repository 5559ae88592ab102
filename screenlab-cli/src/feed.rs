//! CSV feed loading for the replay host.
//!
//! Observations are grouped into one batch per trading day. Fundamentals are
//! kept per symbol in date order and served point-in-time: the record used on
//! a given day is the latest one dated on or before it.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use screenlab_core::{
    FundamentalRecord, FundamentalRow, FundamentalSource, InstrumentId, Observation,
};

#[derive(Debug, Deserialize)]
struct ObservationCsvRow {
    symbol: String,
    date: NaiveDate,
    adjusted_price: f64,
    dollar_volume: f64,
    has_fundamental_data: bool,
}

#[derive(Debug, Deserialize)]
struct FundamentalCsvRow {
    symbol: String,
    date: NaiveDate,
    country_id: String,
    primary_exchange_id: String,
    industry_template_code: String,
    ipo_date: Option<NaiveDate>,
    basic_average_shares_3m: Option<f64>,
    basic_eps_12m: Option<f64>,
    pe_ratio: Option<f64>,
    ev_to_ebitda: Option<f64>,
    forward_roa: Option<f64>,
}

impl FundamentalCsvRow {
    fn into_dated(self) -> (NaiveDate, FundamentalRecord) {
        let row = FundamentalRow {
            symbol: self.symbol,
            country_id: self.country_id,
            primary_exchange_id: self.primary_exchange_id,
            industry_template_code: self.industry_template_code,
            ipo_date: self.ipo_date,
            basic_average_shares_3m: self.basic_average_shares_3m,
            basic_eps_12m: self.basic_eps_12m,
            pe_ratio: self.pe_ratio,
            ev_to_ebitda: self.ev_to_ebitda,
            forward_roa: self.forward_roa,
        };
        (self.date, row.into())
    }
}

/// Observation batches keyed by trading day, in ascending date order.
pub type DailyBatches = BTreeMap<NaiveDate, Vec<Observation>>;

pub fn read_observations<R: Read>(reader: R) -> Result<DailyBatches> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut batches = DailyBatches::new();
    for (line, row) in rdr.deserialize::<ObservationCsvRow>().enumerate() {
        let row = row.with_context(|| format!("invalid observation row {}", line + 2))?;
        batches.entry(row.date).or_default().push(Observation::new(
            row.symbol,
            row.date,
            row.adjusted_price,
            row.dollar_volume,
            row.has_fundamental_data,
        ));
    }
    Ok(batches)
}

pub fn load_observations(path: &Path) -> Result<DailyBatches> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open observations file {}", path.display()))?;
    read_observations(file)
}

/// Per-symbol fundamental history served as of a date.
#[derive(Debug, Default)]
pub struct PointInTimeFundamentals {
    history: HashMap<InstrumentId, Vec<(NaiveDate, FundamentalRecord)>>,
}

impl PointInTimeFundamentals {
    pub fn insert(&mut self, date: NaiveDate, record: FundamentalRecord) {
        let entries = self.history.entry(record.id.clone()).or_default();
        let pos = entries.partition_point(|(d, _)| *d <= date);
        entries.insert(pos, (date, record));
    }

    /// Latest record for `id` dated on or before `as_of`.
    pub fn as_of(&self, id: &InstrumentId, as_of: NaiveDate) -> Option<&FundamentalRecord> {
        let entries = self.history.get(id)?;
        let pos = entries.partition_point(|(d, _)| *d <= as_of);
        pos.checked_sub(1).map(|i| &entries[i].1)
    }

    pub fn symbols(&self) -> usize {
        self.history.len()
    }
}

impl FundamentalSource for PointInTimeFundamentals {
    fn fundamentals(&self, ids: &[InstrumentId], as_of: NaiveDate) -> Vec<FundamentalRecord> {
        ids.iter()
            .filter_map(|id| self.as_of(id, as_of).cloned())
            .collect()
    }
}

pub fn read_fundamentals<R: Read>(reader: R) -> Result<PointInTimeFundamentals> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut store = PointInTimeFundamentals::default();
    for (line, row) in rdr.deserialize::<FundamentalCsvRow>().enumerate() {
        let row = row.with_context(|| format!("invalid fundamentals row {}", line + 2))?;
        let (date, record) = row.into_dated();
        store.insert(date, record);
    }
    Ok(store)
}

pub fn load_fundamentals(path: &Path) -> Result<PointInTimeFundamentals> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open fundamentals file {}", path.display()))?;
    read_fundamentals(file)
}
