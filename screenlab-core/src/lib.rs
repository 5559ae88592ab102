//! ScreenLab Core — universe selection engine.
//!
//! This crate narrows a large instrument universe to a small, periodically
//! refreshed target list:
//! - Domain types (observations, fundamental snapshots, sectors, exchanges)
//! - Incremental rolling indicators (SMA, long/short trend flags)
//! - Per-instrument state store with optional idle eviction
//! - Coarse selector: dollar-volume cut, trend gate, rebalance throttle
//! - Fine selector: eligibility, sector quotas, EV/EBITDA then ROA ranking
//! - Selection engine wiring coarse into fine each cycle

pub mod coarse;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fine;
pub mod indicators;
pub mod schedule;
pub mod state;

pub use coarse::{
    CoarseOutcome, CoarseReport, CoarseSelector, LiquidityMetric, LiquidityRanks, UpdateScope,
};
pub use config::{ConfigError, ScreenerConfig};
pub use domain::{Exchange, FundamentalRecord, FundamentalRow, InstrumentId, Observation, Sector};
pub use engine::{FundamentalSource, SelectionEngine, UniverseChange, UniverseDiff};
pub use error::SelectionError;
pub use fine::{FineReport, FineSelection, FineSelector};
pub use schedule::{CycleKey, RebalanceSchedule};
pub use state::{EvictionPolicy, InstrumentState, StateStore};
