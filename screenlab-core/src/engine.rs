//! Selection engine — wires the coarse selector into the fine selector.
//!
//! The engine holds no state of its own beyond the two selectors and the
//! rebalance schedule. The coarse liquidity map is lent to the fine pass for
//! the duration of one call and never retained.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::coarse::{CoarseOutcome, CoarseSelector};
use crate::config::{ConfigError, ScreenerConfig};
use crate::domain::{FundamentalRecord, InstrumentId, Observation};
use crate::error::SelectionError;
use crate::fine::{FineSelection, FineSelector};
use crate::schedule::CycleKey;

/// Supplies fundamental snapshots for the coarse shortlist.
pub trait FundamentalSource {
    /// Point-in-time records for `ids` as of `as_of`. Identifiers without data
    /// may simply be left out.
    fn fundamentals(&self, ids: &[InstrumentId], as_of: NaiveDate) -> Vec<FundamentalRecord>;
}

impl<F> FundamentalSource for F
where
    F: Fn(&[InstrumentId], NaiveDate) -> Vec<FundamentalRecord>,
{
    fn fundamentals(&self, ids: &[InstrumentId], as_of: NaiveDate) -> Vec<FundamentalRecord> {
        self(ids, as_of)
    }
}

/// A fixed snapshot keyed by identifier; ignores `as_of`.
impl FundamentalSource for HashMap<InstrumentId, FundamentalRecord> {
    fn fundamentals(&self, ids: &[InstrumentId], _as_of: NaiveDate) -> Vec<FundamentalRecord> {
        ids.iter().filter_map(|id| self.get(id).cloned()).collect()
    }
}

/// Outcome of one full cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum UniverseChange {
    /// Throttled; keep the current holdings.
    Unchanged,
    /// New target list, best first. May be empty.
    Rebalanced(Vec<InstrumentId>),
}

/// Instruments entering and leaving the target list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniverseDiff {
    pub added: Vec<InstrumentId>,
    pub removed: Vec<InstrumentId>,
}

impl UniverseDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl UniverseChange {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, UniverseChange::Unchanged)
    }

    /// Diff against the previous target list. `Unchanged` yields an empty diff.
    ///
    /// `added` follows the new list's order, `removed` the previous list's.
    pub fn diff(&self, previous: &[InstrumentId]) -> UniverseDiff {
        match self {
            UniverseChange::Unchanged => UniverseDiff::default(),
            UniverseChange::Rebalanced(current) => {
                let prev: HashSet<&InstrumentId> = previous.iter().collect();
                let curr: HashSet<&InstrumentId> = current.iter().collect();
                UniverseDiff {
                    added: current.iter().filter(|id| !prev.contains(id)).cloned().collect(),
                    removed: previous.iter().filter(|id| !curr.contains(id)).cloned().collect(),
                }
            }
        }
    }
}

/// Orchestrates coarse → fine each cycle.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    config: ScreenerConfig,
    coarse: CoarseSelector,
    fine: FineSelector,
}

impl SelectionEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: ScreenerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let coarse = CoarseSelector::new(&config);
        let fine = FineSelector::new(&config);
        Ok(Self {
            config,
            coarse,
            fine,
        })
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    pub fn coarse(&self) -> &CoarseSelector {
        &self.coarse
    }

    /// Throttle key for `date` under the configured schedule.
    pub fn cycle_key(&self, date: NaiveDate) -> CycleKey {
        self.config.schedule.key_for(date)
    }

    pub fn select_coarse(&mut self, key: CycleKey, observations: &[Observation]) -> CoarseOutcome {
        self.coarse.select_coarse(key, observations)
    }

    /// Fine pass against the liquidity map of the last coarse cycle.
    pub fn select_fine(
        &self,
        as_of: NaiveDate,
        records: &[FundamentalRecord],
    ) -> Result<Vec<InstrumentId>, SelectionError> {
        self.fine.select_fine(as_of, records, self.coarse.ranks())
    }

    pub fn select_fine_detailed(
        &self,
        as_of: NaiveDate,
        records: &[FundamentalRecord],
    ) -> Result<FineSelection, SelectionError> {
        self.fine.select_fine_detailed(as_of, records, self.coarse.ranks())
    }

    /// Run one full cycle for `as_of`.
    ///
    /// Records the source returns for identifiers outside the coarse output
    /// are dropped before the fine pass.
    pub fn run_cycle(
        &mut self,
        as_of: NaiveDate,
        observations: &[Observation],
        source: &dyn FundamentalSource,
    ) -> Result<UniverseChange, SelectionError> {
        let key = self.cycle_key(as_of);
        let candidates = match self.coarse.select_coarse(key, observations) {
            CoarseOutcome::Unchanged => return Ok(UniverseChange::Unchanged),
            CoarseOutcome::Selected(ids) => ids,
        };
        if candidates.is_empty() {
            info!(%as_of, "no coarse candidates; target list is empty");
            return Ok(UniverseChange::Rebalanced(Vec::new()));
        }

        let allowed: HashSet<&InstrumentId> = candidates.iter().collect();
        let (records, foreign): (Vec<FundamentalRecord>, Vec<FundamentalRecord>) = source
            .fundamentals(&candidates, as_of)
            .into_iter()
            .partition(|r| allowed.contains(&r.id));
        if !foreign.is_empty() {
            warn!(
                %as_of,
                dropped = foreign.len(),
                first = %foreign[0].id,
                "fundamental source returned records outside the coarse selection"
            );
        }

        let selected = self.select_fine(as_of, &records)?;
        Ok(UniverseChange::Rebalanced(selected))
    }
}
