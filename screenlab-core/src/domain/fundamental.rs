//! Point-in-time fundamental snapshot for one instrument.
//!
//! The record is nested the way fundamental vendors publish it (company
//! reference, security reference, earning reports, valuation ratios).
//! Every numeric field is optional: a missing or non-finite value makes the
//! record ineligible for fine selection rather than raising an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::InstrumentId;

/// Morningstar-style industry template code.
///
/// Only these six codes take part in sector-stratified selection; anything
/// else is silently excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "N")]
    Normal,
    #[serde(rename = "M")]
    Mining,
    #[serde(rename = "U")]
    Utility,
    #[serde(rename = "T")]
    Transportation,
    #[serde(rename = "B")]
    Bank,
    #[serde(rename = "I")]
    Insurance,
}

impl Sector {
    /// Iteration order used by the quota stage.
    pub const ALL: [Sector; 6] = [
        Sector::Normal,
        Sector::Mining,
        Sector::Utility,
        Sector::Transportation,
        Sector::Bank,
        Sector::Insurance,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(Sector::Normal),
            "M" => Some(Sector::Mining),
            "U" => Some(Sector::Utility),
            "T" => Some(Sector::Transportation),
            "B" => Some(Sector::Bank),
            "I" => Some(Sector::Insurance),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Sector::Normal => "N",
            Sector::Mining => "M",
            Sector::Utility => "U",
            Sector::Transportation => "T",
            Sector::Bank => "B",
            Sector::Insurance => "I",
        }
    }
}

/// Primary listing exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    #[serde(rename = "NYS")]
    Nyse,
    #[serde(rename = "NAS")]
    Nasdaq,
}

impl Exchange {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NYS" => Some(Exchange::Nyse),
            "NAS" => Some(Exchange::Nasdaq),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Exchange::Nyse => "NYS",
            Exchange::Nasdaq => "NAS",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyReference {
    pub country_id: String,
    pub primary_exchange_id: String,
    pub industry_template_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityReference {
    pub ipo_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningReports {
    pub basic_average_shares_three_months: Option<f64>,
    pub basic_eps_twelve_months: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationRatios {
    pub pe_ratio: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub forward_roa: Option<f64>,
}

/// Immutable fundamental snapshot. The engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    pub id: InstrumentId,
    pub company_reference: CompanyReference,
    pub security_reference: SecurityReference,
    pub earning_reports: EarningReports,
    pub valuation_ratios: ValuationRatios,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl FundamentalRecord {
    pub fn sector(&self) -> Option<Sector> {
        Sector::from_code(&self.company_reference.industry_template_code)
    }

    pub fn exchange(&self) -> Option<Exchange> {
        Exchange::from_code(&self.company_reference.primary_exchange_id)
    }

    /// Whole days between the IPO date and `as_of`. `None` if the IPO date is unknown.
    pub fn ipo_age_days(&self, as_of: NaiveDate) -> Option<i64> {
        self.security_reference
            .ipo_date
            .map(|ipo| (as_of - ipo).num_days())
    }

    /// shares (3M average) × EPS (12M) × P/E.
    ///
    /// Not a literal market capitalisation; the eligibility threshold is
    /// calibrated against this product. `None` if any factor is missing or
    /// non-finite, or the product overflows.
    pub fn market_cap_proxy(&self) -> Option<f64> {
        let shares = finite(self.earning_reports.basic_average_shares_three_months)?;
        let eps = finite(self.earning_reports.basic_eps_twelve_months)?;
        let pe = finite(self.valuation_ratios.pe_ratio)?;
        Some(shares * eps * pe).filter(|v| v.is_finite())
    }

    pub fn ev_to_ebitda(&self) -> Option<f64> {
        finite(self.valuation_ratios.ev_to_ebitda)
    }

    pub fn forward_roa(&self) -> Option<f64> {
        finite(self.valuation_ratios.forward_roa)
    }
}

/// Flat, one-row-per-record form used by tabular feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRow {
    pub symbol: String,
    pub country_id: String,
    pub primary_exchange_id: String,
    pub industry_template_code: String,
    pub ipo_date: Option<NaiveDate>,
    pub basic_average_shares_3m: Option<f64>,
    pub basic_eps_12m: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub forward_roa: Option<f64>,
}

impl From<FundamentalRow> for FundamentalRecord {
    fn from(row: FundamentalRow) -> Self {
        Self {
            id: InstrumentId(row.symbol),
            company_reference: CompanyReference {
                country_id: row.country_id,
                primary_exchange_id: row.primary_exchange_id,
                industry_template_code: row.industry_template_code,
            },
            security_reference: SecurityReference {
                ipo_date: row.ipo_date,
            },
            earning_reports: EarningReports {
                basic_average_shares_three_months: row.basic_average_shares_3m,
                basic_eps_twelve_months: row.basic_eps_12m,
            },
            valuation_ratios: ValuationRatios {
                pe_ratio: row.pe_ratio,
                ev_to_ebitda: row.ev_to_ebitda,
                forward_roa: row.forward_roa,
            },
        }
    }
}
