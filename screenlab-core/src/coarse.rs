//! Coarse selection: liquidity cut plus trend gating, throttled per cycle key.
//!
//! Each non-throttled cycle:
//! 1. Keep observations with fundamental data.
//! 2. Stable sort by dollar volume, descending, and keep the top `coarse_count`.
//! 3. Feed those observations into the per-instrument state store, then
//!    apply the eviction policy.
//! 4. Qualify every tracked instrument whose price is above its long SMA
//!    and below its short SMA. This scans the whole store, so an instrument
//!    that dropped out of this cycle's top list can still qualify on its
//!    last known flags.
//! 5. Rebuild the liquidity map for exactly the qualifying set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::ScreenerConfig;
use crate::domain::{InstrumentId, Observation};
use crate::schedule::CycleKey;
use crate::state::{EvictionPolicy, StateStore};

/// Which observations feed the state store each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScope {
    /// Only the instruments kept by the dollar-volume cut.
    #[default]
    TopByVolume,
    /// Every observation that carries fundamental data.
    FullBatch,
}

/// Value published per qualifying instrument for the fine-stage sector sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityMetric {
    /// The instrument's last observed dollar volume.
    #[default]
    DollarVolume,
    /// A constant 1.0 for every instrument, which turns the sector sort
    /// into a stable pass-through of input order.
    Placeholder,
}

/// Result of one coarse call.
#[derive(Debug, Clone, PartialEq)]
pub enum CoarseOutcome {
    /// Throttle key matched the previous run; nothing was done.
    Unchanged,
    /// Qualifying identifiers, in first-observed order.
    Selected(Vec<InstrumentId>),
}

impl CoarseOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, CoarseOutcome::Unchanged)
    }

    pub fn selected(&self) -> Option<&[InstrumentId]> {
        match self {
            CoarseOutcome::Unchanged => None,
            CoarseOutcome::Selected(ids) => Some(ids),
        }
    }
}

/// Identifier → liquidity value for the instruments that qualified in the
/// most recent coarse cycle. Membership doubles as the qualification test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiquidityRanks {
    values: HashMap<InstrumentId, f64>,
}

impl LiquidityRanks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: InstrumentId, value: f64) {
        self.values.insert(id, value);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<f64> {
        self.values.get(id).copied()
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(InstrumentId, f64)> for LiquidityRanks {
    fn from_iter<I: IntoIterator<Item = (InstrumentId, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Counters from one coarse cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoarseReport {
    pub cycle: u64,
    pub observations: usize,
    pub with_fundamentals: usize,
    pub rejected_insane: usize,
    pub retained: usize,
    pub updated: usize,
    pub evicted: usize,
    pub tracked: usize,
    pub qualified: usize,
}

/// Stateful coarse selector.
#[derive(Debug, Clone)]
pub struct CoarseSelector {
    coarse_count: usize,
    update_scope: UpdateScope,
    liquidity_metric: LiquidityMetric,
    eviction: EvictionPolicy,
    store: StateStore,
    last_key: Option<CycleKey>,
    cycle: u64,
    ranks: LiquidityRanks,
    last_report: Option<CoarseReport>,
}

impl CoarseSelector {
    pub fn new(config: &ScreenerConfig) -> Self {
        Self {
            coarse_count: config.coarse_count,
            update_scope: config.update_scope,
            liquidity_metric: config.liquidity_metric,
            eviction: config.eviction,
            store: StateStore::new(config.long_window, config.short_window),
            last_key: None,
            cycle: 0,
            ranks: LiquidityRanks::new(),
            last_report: None,
        }
    }

    /// Run one coarse cycle, or return `Unchanged` if `key` equals the key
    /// of the previous run. A throttled call touches no state.
    pub fn select_coarse(&mut self, key: CycleKey, observations: &[Observation]) -> CoarseOutcome {
        if self.last_key == Some(key) {
            debug!(%key, "coarse selection throttled");
            return CoarseOutcome::Unchanged;
        }
        self.last_key = Some(key);
        self.cycle += 1;
        let cycle = self.cycle;

        let with_fundamentals: Vec<&Observation> = observations
            .iter()
            .filter(|o| o.has_fundamental_data)
            .collect();
        let mut candidates: Vec<&Observation> =
            with_fundamentals.iter().copied().filter(|o| o.is_sane()).collect();
        let rejected_insane = with_fundamentals.len() - candidates.len();
        if rejected_insane > 0 {
            debug!(cycle, rejected_insane, "dropping observations with invalid price or volume");
        }

        let update_all = match self.update_scope {
            UpdateScope::FullBatch => candidates.clone(),
            UpdateScope::TopByVolume => Vec::new(),
        };

        // sort_by is stable: equal volumes keep input order.
        candidates.sort_by(|a, b| b.dollar_volume.total_cmp(&a.dollar_volume));
        candidates.truncate(self.coarse_count);
        let retained = candidates.len();

        let to_update = match self.update_scope {
            UpdateScope::TopByVolume => candidates,
            UpdateScope::FullBatch => update_all,
        };
        for obs in &to_update {
            self.store.observe(obs, cycle);
        }
        let evicted = self.store.evict(self.eviction, cycle);

        let metric = self.liquidity_metric;
        let mut ranks = LiquidityRanks::new();
        let mut selected = Vec::new();
        for (id, state) in self.store.trend_qualified() {
            let value = match metric {
                LiquidityMetric::DollarVolume => state.last_dollar_volume(),
                LiquidityMetric::Placeholder => 1.0,
            };
            ranks.insert(id.clone(), value);
            selected.push(id.clone());
        }
        self.ranks = ranks;

        let report = CoarseReport {
            cycle,
            observations: observations.len(),
            with_fundamentals: with_fundamentals.len(),
            rejected_insane,
            retained,
            updated: to_update.len(),
            evicted,
            tracked: self.store.len(),
            qualified: selected.len(),
        };
        info!(
            %key,
            cycle,
            observations = report.observations,
            retained = report.retained,
            tracked = report.tracked,
            qualified = report.qualified,
            evicted = report.evicted,
            "coarse selection complete"
        );
        self.last_report = Some(report);

        CoarseOutcome::Selected(selected)
    }

    /// Liquidity map published by the most recent non-throttled cycle.
    pub fn ranks(&self) -> &LiquidityRanks {
        &self.ranks
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn last_key(&self) -> Option<CycleKey> {
        self.last_key
    }

    /// Number of cycles that actually ran.
    pub fn cycles_run(&self) -> u64 {
        self.cycle
    }

    pub fn last_report(&self) -> Option<&CoarseReport> {
        self.last_report.as_ref()
    }
}
