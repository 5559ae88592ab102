//! Fine selection: fundamental eligibility, sector quotas, two-pass ranking.
//!
//! Stage A keeps US-domiciled NYSE/NASDAQ listings older than the IPO-age
//! threshold whose shares × EPS × P/E product clears the size threshold.
//! Stage B keeps, per sector, the most liquid
//! `ceil(k_sector × fine_count / k_eligible)` instruments. Stage C sorts the
//! survivors by EV/EBITDA descending, caps them at `fine_count`, re-sorts
//! that subset by forward ROA ascending and returns the first
//! `portfolio_count`.
//!
//! All sorts are stable, so ties keep their incoming order.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::coarse::LiquidityRanks;
use crate::config::ScreenerConfig;
use crate::domain::{Exchange, FundamentalRecord, InstrumentId, Sector};
use crate::error::SelectionError;

/// Number of instruments kept from a sector of `sector_len` when
/// `eligible_len` instruments passed eligibility:
/// `ceil(sector_len × fine_count / eligible_len)`, never more than the sector holds.
pub fn sector_quota(sector_len: usize, fine_count: usize, eligible_len: usize) -> usize {
    if eligible_len == 0 {
        return 0;
    }
    let numerator = sector_len as u128 * fine_count as u128;
    let quota = numerator.div_ceil(eligible_len as u128);
    quota.min(sector_len as u128) as usize
}

/// An eligible record with its ranking inputs already validated.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    record: &'a FundamentalRecord,
    sector: Option<Sector>,
    ev_to_ebitda: f64,
    forward_roa: f64,
}

/// Counters from one fine pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FineReport {
    pub records: usize,
    pub eligible: usize,
    /// (sector code, subset size, kept) in sector iteration order.
    pub sectors: Vec<(&'static str, usize, usize)>,
    pub top_fine: usize,
    pub ranked: usize,
    pub selected: usize,
}

/// Ordered selection plus the counters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FineSelection {
    pub symbols: Vec<InstrumentId>,
    pub report: FineReport,
}

/// Stateless fine selector.
#[derive(Debug, Clone)]
pub struct FineSelector {
    fine_count: usize,
    portfolio_count: usize,
    sectors: Vec<Sector>,
    exchanges: Vec<Exchange>,
    country: String,
    min_market_cap_proxy: f64,
    min_ipo_age_days: i64,
}

impl FineSelector {
    /// Repeated sector codes are collapsed to their first occurrence, so a
    /// sector is stratified at most once per pass.
    pub fn new(config: &ScreenerConfig) -> Self {
        let mut sectors: Vec<Sector> = Vec::with_capacity(config.sectors.len());
        for &sector in &config.sectors {
            if !sectors.contains(&sector) {
                sectors.push(sector);
            }
        }
        Self {
            fine_count: config.fine_count,
            portfolio_count: config.portfolio_count,
            sectors,
            exchanges: config.exchanges.clone(),
            country: config.country.clone(),
            min_market_cap_proxy: config.min_market_cap_proxy,
            min_ipo_age_days: config.min_ipo_age_days,
        }
    }

    /// Rank `records` and return at most `portfolio_count` identifiers.
    ///
    /// `ranks` is the liquidity map from the coarse cycle that produced the
    /// candidate set. A record in a tracked sector without a liquidity entry
    /// aborts the pass.
    pub fn select_fine(
        &self,
        as_of: NaiveDate,
        records: &[FundamentalRecord],
        ranks: &LiquidityRanks,
    ) -> Result<Vec<InstrumentId>, SelectionError> {
        self.select_fine_detailed(as_of, records, ranks)
            .map(|selection| selection.symbols)
    }

    /// As [`select_fine`](Self::select_fine), also returning stage counters.
    pub fn select_fine_detailed(
        &self,
        as_of: NaiveDate,
        records: &[FundamentalRecord],
        ranks: &LiquidityRanks,
    ) -> Result<FineSelection, SelectionError> {
        let mut report = FineReport {
            records: records.len(),
            ..Default::default()
        };

        // Stage A
        let eligible: Vec<Candidate<'_>> = records
            .iter()
            .filter_map(|record| self.eligible(record, as_of))
            .collect();
        report.eligible = eligible.len();
        if eligible.is_empty() {
            info!(%as_of, records = report.records, "fine selection: no eligible records");
            return Ok(FineSelection {
                symbols: Vec::new(),
                report,
            });
        }

        // Stage B
        let top_fine = self.stratify(&eligible, ranks, &mut report)?;
        report.top_fine = top_fine.len();

        // Stage C
        let symbols = self.rank(top_fine, &mut report);
        report.selected = symbols.len();

        info!(
            %as_of,
            records = report.records,
            eligible = report.eligible,
            top_fine = report.top_fine,
            selected = report.selected,
            "fine selection complete"
        );
        Ok(FineSelection { symbols, report })
    }

    /// Stage A predicate. Missing or non-finite inputs make a record ineligible.
    pub fn is_eligible(&self, record: &FundamentalRecord, as_of: NaiveDate) -> bool {
        self.eligible(record, as_of).is_some()
    }

    fn eligible<'a>(
        &self,
        record: &'a FundamentalRecord,
        as_of: NaiveDate,
    ) -> Option<Candidate<'a>> {
        if record.company_reference.country_id != self.country {
            return None;
        }
        let exchange = record.exchange()?;
        if !self.exchanges.contains(&exchange) {
            return None;
        }
        if record.ipo_age_days(as_of)? <= self.min_ipo_age_days {
            return None;
        }
        if record.market_cap_proxy()? <= self.min_market_cap_proxy {
            return None;
        }
        let (Some(ev_to_ebitda), Some(forward_roa)) =
            (record.ev_to_ebitda(), record.forward_roa())
        else {
            debug!(id = %record.id, "ineligible: missing valuation ratios");
            return None;
        };
        Some(Candidate {
            record,
            sector: record.sector(),
            ev_to_ebitda,
            forward_roa,
        })
    }

    /// Stage B: per-sector liquidity quota, concatenated in sector order.
    fn stratify<'a>(
        &self,
        eligible: &[Candidate<'a>],
        ranks: &LiquidityRanks,
        report: &mut FineReport,
    ) -> Result<Vec<Candidate<'a>>, SelectionError> {
        let total = eligible.len();
        let mut top_fine = Vec::new();

        for &sector in &self.sectors {
            let mut subset = Vec::new();
            for candidate in eligible.iter().filter(|c| c.sector == Some(sector)) {
                let liquidity = ranks.get(&candidate.record.id).ok_or_else(|| {
                    SelectionError::MissingLiquidity {
                        id: candidate.record.id.clone(),
                    }
                })?;
                subset.push((*candidate, liquidity));
            }
            subset.sort_by(|a, b| b.1.total_cmp(&a.1));

            let quota = sector_quota(subset.len(), self.fine_count, total);
            report.sectors.push((sector.code(), subset.len(), quota));
            top_fine.extend(subset.into_iter().take(quota).map(|(c, _)| c));
        }

        Ok(top_fine)
    }

    /// Stage C: EV/EBITDA descending, cap, forward ROA ascending, cap.
    fn rank(
        &self,
        mut top_fine: Vec<Candidate<'_>>,
        report: &mut FineReport,
    ) -> Vec<InstrumentId> {
        top_fine.sort_by(|a, b| b.ev_to_ebitda.total_cmp(&a.ev_to_ebitda));
        top_fine.truncate(self.fine_count);
        report.ranked = top_fine.len();

        top_fine.sort_by(|a, b| a.forward_roa.total_cmp(&b.forward_roa));
        top_fine
            .into_iter()
            .take(self.portfolio_count)
            .map(|c| c.record.id.clone())
            .collect()
    }
}
