//! End-to-end selection scenarios through `SelectionEngine`.
//!
//! Tests:
//! 1. Empty coarse batch on a fresh key selects nothing (not Unchanged).
//! 2. Twelve eligible names across six sectors: all survive the quota and the
//!    final list is the ten lowest-ROA names in ROA order.
//! 3. A recent IPO is excluded regardless of its other fields.
//! 4. Multi-month replay with a calendar-month schedule rebalances once per month.
//! 5. Day-of-month keys rerun on each new day-number.

use chrono::{Datelike, NaiveDate};
use screenlab_core::{
    FundamentalRecord, FundamentalRow, InstrumentId, Observation, RebalanceSchedule,
    ScreenerConfig, SelectionEngine, UniverseChange,
};
use std::collections::HashMap;

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn fundamentals(symbol: &str, sector: &str, ev: f64, roa: f64) -> FundamentalRecord {
    FundamentalRow {
        symbol: symbol.into(),
        country_id: "USA".into(),
        primary_exchange_id: "NYS".into(),
        industry_template_code: sector.into(),
        ipo_date: Some(d(2005, 3, 1)),
        basic_average_shares_3m: Some(2e9),
        basic_eps_12m: Some(4.0),
        pe_ratio: Some(20.0),
        ev_to_ebitda: Some(ev),
        forward_roa: Some(roa),
    }
    .into()
}

/// Price path that ends in a pullback inside an uptrend for (long=3, short=2).
const PULLBACK: [f64; 4] = [10.0, 11.0, 12.0, 11.8];

fn small_config(schedule: RebalanceSchedule) -> ScreenerConfig {
    ScreenerConfig {
        long_window: 3,
        short_window: 2,
        schedule,
        ..Default::default()
    }
}

/// Feed every symbol the pullback path over four consecutive days and
/// return the change produced on the last day.
fn run_pullback(
    engine: &mut SelectionEngine,
    symbols: &[String],
    snapshot: &HashMap<InstrumentId, FundamentalRecord>,
) -> UniverseChange {
    let mut last = UniverseChange::Unchanged;
    for (i, price) in PULLBACK.iter().enumerate() {
        let day = d(2024, 3, 4 + i as u32);
        let batch: Vec<Observation> = symbols
            .iter()
            .enumerate()
            .map(|(n, s)| Observation::new(s.as_str(), day, *price, 1e8 - n as f64, true))
            .collect();
        last = engine.run_cycle(day, &batch, snapshot).unwrap();
    }
    last
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn empty_batch_on_new_key_is_empty_selection() {
    let mut engine = SelectionEngine::new(ScreenerConfig::default()).unwrap();
    let outcome = engine.select_coarse(engine.cycle_key(d(2024, 2, 1)), &[]);
    assert_eq!(outcome.selected(), Some(&[][..]));
}

#[test]
fn twelve_names_six_sectors() {
    let mut engine = SelectionEngine::new(small_config(RebalanceSchedule::Daily)).unwrap();
    let codes = ["N", "M", "U", "T", "B", "I"];
    let mut symbols = Vec::new();
    let mut snapshot = HashMap::new();
    for (i, code) in codes.iter().enumerate() {
        for j in 0..2 {
            let n = i * 2 + j;
            let symbol = format!("S{n:02}");
            // EV rises with n, ROA falls with n
            let record = fundamentals(&symbol, code, 5.0 + n as f64, 0.30 - n as f64 / 100.0);
            snapshot.insert(record.id.clone(), record);
            symbols.push(symbol);
        }
    }

    let change = run_pullback(&mut engine, &symbols, &snapshot);
    let UniverseChange::Rebalanced(selected) = change else {
        panic!("expected a rebalance");
    };
    assert_eq!(selected.len(), 10);
    let got: Vec<&str> = selected.iter().map(|s| s.as_str()).collect();
    assert_eq!(
        got,
        vec!["S11", "S10", "S09", "S08", "S07", "S06", "S05", "S04", "S03", "S02"]
    );

    let detail = engine
        .select_fine_detailed(d(2024, 3, 7), &snapshot.values().cloned().collect::<Vec<_>>())
        .unwrap();
    assert_eq!(detail.report.eligible, 12);
    assert_eq!(detail.report.top_fine, 12);
    assert!(detail.report.sectors.iter().all(|&(_, len, kept)| len == 2 && kept == 2));
}

#[test]
fn recent_ipo_is_excluded() {
    let mut engine = SelectionEngine::new(small_config(RebalanceSchedule::Daily)).unwrap();
    let symbols = vec!["FRESH".to_string(), "SEASONED".to_string()];
    let mut snapshot = HashMap::new();

    let mut fresh = fundamentals("FRESH", "N", 50.0, 0.0);
    fresh.security_reference.ipo_date = Some(d(2024, 3, 7) - chrono::Duration::days(100));
    snapshot.insert(fresh.id.clone(), fresh);
    let seasoned = fundamentals("SEASONED", "N", 1.0, 0.5);
    snapshot.insert(seasoned.id.clone(), seasoned);

    let change = run_pullback(&mut engine, &symbols, &snapshot);
    assert_eq!(
        change,
        UniverseChange::Rebalanced(vec![InstrumentId::new("SEASONED")])
    );
}

#[test]
fn calendar_month_schedule_rebalances_monthly() {
    let config = ScreenerConfig {
        long_window: 20,
        short_window: 5,
        schedule: RebalanceSchedule::CalendarMonth,
        ..Default::default()
    };
    let mut engine = SelectionEngine::new(config).unwrap();
    let snapshot: HashMap<InstrumentId, FundamentalRecord> = HashMap::new();

    let mut day = d(2024, 1, 2);
    let end = d(2024, 6, 28);
    let mut rebalance_months = Vec::new();
    let mut i = 0.0;
    while day <= end {
        let batch = [Observation::new("TREND", day, 100.0 + i, 5e8, true)];
        let change = engine.run_cycle(day, &batch, &snapshot).unwrap();
        if !change.is_unchanged() {
            rebalance_months.push(day.month());
        }
        day += chrono::Duration::days(1);
        i += 0.5;
    }
    assert_eq!(rebalance_months, vec![1, 2, 3, 4, 5, 6]);
    // Each run fed exactly one sample.
    let state = engine.coarse().store().get(&InstrumentId::new("TREND")).unwrap();
    assert_eq!(state.indicators().samples(), 6);
}

#[test]
fn day_of_month_schedule_reruns_on_new_day_numbers() {
    let mut engine = SelectionEngine::new(small_config(RebalanceSchedule::DayOfMonth)).unwrap();
    let snapshot: HashMap<InstrumentId, FundamentalRecord> = HashMap::new();
    let mut run = |day: NaiveDate| {
        let batch = [Observation::new("X", day, 10.0, 1e6, true)];
        engine.run_cycle(day, &batch, &snapshot).unwrap()
    };

    assert!(!run(d(2024, 1, 15)).is_unchanged());
    assert!(run(d(2024, 1, 15)).is_unchanged());
    assert!(!run(d(2024, 1, 16)).is_unchanged());
    // Same day-number as the previous run, one month later: throttled.
    assert!(run(d(2024, 2, 16)).is_unchanged());
}
