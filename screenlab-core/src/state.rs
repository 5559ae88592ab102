//! Per-instrument working set for the coarse selector.
//!
//! Entries are created on first observation and, under the default policy,
//! never removed. Iteration follows first-observed order so every scan is
//! deterministic regardless of hash seed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{InstrumentId, Observation};
use crate::indicators::RollingIndicatorSet;

/// When to drop instruments that stopped appearing in the coarse feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep every instrument ever observed.
    #[default]
    Never,
    /// Drop an instrument once it has gone more than `cycles` coarse cycles
    /// without an update. Checked after the cycle's updates are applied, so
    /// `cycles: 0` keeps only the instruments updated in the current cycle.
    IdleCycles { cycles: u64 },
}

/// Rolling technical state for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    indicators: RollingIndicatorSet,
    last_dollar_volume: f64,
    first_seen_cycle: u64,
    last_seen_cycle: u64,
}

impl InstrumentState {
    pub fn new(long_window: usize, short_window: usize, cycle: u64) -> Self {
        Self {
            indicators: RollingIndicatorSet::new(long_window, short_window),
            last_dollar_volume: 0.0,
            first_seen_cycle: cycle,
            last_seen_cycle: cycle,
        }
    }

    pub fn indicators(&self) -> &RollingIndicatorSet {
        &self.indicators
    }

    pub fn is_above_long_avg(&self) -> bool {
        self.indicators.is_above_long_avg()
    }

    pub fn is_below_short_avg(&self) -> bool {
        self.indicators.is_below_short_avg()
    }

    pub fn is_trend_qualified(&self) -> bool {
        self.indicators.is_trend_qualified()
    }

    pub fn last_dollar_volume(&self) -> f64 {
        self.last_dollar_volume
    }

    pub fn first_seen_cycle(&self) -> u64 {
        self.first_seen_cycle
    }

    pub fn last_seen_cycle(&self) -> u64 {
        self.last_seen_cycle
    }
}

/// Owned map from identifier to state, plus first-observed order.
#[derive(Debug, Clone)]
pub struct StateStore {
    long_window: usize,
    short_window: usize,
    states: HashMap<InstrumentId, InstrumentState>,
    order: Vec<InstrumentId>,
}

impl StateStore {
    pub fn new(long_window: usize, short_window: usize) -> Self {
        Self {
            long_window,
            short_window,
            states: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Apply one observation, creating the entry if the instrument is new.
    pub fn observe(&mut self, obs: &Observation, cycle: u64) {
        if !self.states.contains_key(&obs.id) {
            debug!(id = %obs.id, cycle, "tracking new instrument");
            self.order.push(obs.id.clone());
        }
        let (long_window, short_window) = (self.long_window, self.short_window);
        let state = self
            .states
            .entry(obs.id.clone())
            .or_insert_with(|| InstrumentState::new(long_window, short_window, cycle));
        state.indicators.update(obs.timestamp, obs.adjusted_price);
        state.last_dollar_volume = obs.dollar_volume;
        state.last_seen_cycle = cycle;
    }

    /// Drop idle entries according to `policy`. Returns how many were removed.
    ///
    /// Call after the current cycle's updates: an entry updated in
    /// `current_cycle` has been idle for zero cycles.
    pub fn evict(&mut self, policy: EvictionPolicy, current_cycle: u64) -> usize {
        let max_idle = match policy {
            EvictionPolicy::Never => return 0,
            EvictionPolicy::IdleCycles { cycles } => cycles,
        };

        let before = self.states.len();
        self.states.retain(|id, state| {
            let keep = current_cycle.saturating_sub(state.last_seen_cycle) <= max_idle;
            if !keep {
                debug!(
                    %id,
                    last_seen = state.last_seen_cycle,
                    current_cycle,
                    "evicting idle instrument"
                );
            }
            keep
        });
        let states = &self.states;
        self.order.retain(|id| states.contains_key(id));
        before - self.states.len()
    }

    pub fn get(&self, id: &InstrumentId) -> Option<&InstrumentState> {
        self.states.get(id)
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.states.contains_key(id)
    }

    /// All entries in first-observed order.
    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentId, &InstrumentState)> {
        self.order
            .iter()
            .filter_map(move |id| self.states.get(id).map(|state| (id, state)))
    }

    /// Entries whose long and short flags both hold, in first-observed order.
    pub fn trend_qualified(&self) -> impl Iterator<Item = (&InstrumentId, &InstrumentState)> {
        self.iter().filter(|(_, state)| state.is_trend_qualified())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
