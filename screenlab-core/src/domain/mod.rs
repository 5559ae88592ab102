//! Domain types for ScreenLab

pub mod fundamental;
pub mod ids;
pub mod observation;

pub use fundamental::{
    CompanyReference, EarningReports, Exchange, FundamentalRecord, FundamentalRow,
    SecurityReference, Sector, ValuationRatios,
};
pub use ids::InstrumentId;
pub use observation::Observation;
