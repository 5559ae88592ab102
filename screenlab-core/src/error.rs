//! Selection faults.
//!
//! Empty results and throttled cycles are not errors. The only fault is a
//! host feeding the fine stage an instrument the coarse stage never
//! qualified; the cycle is aborted rather than ranked on partial data.

use thiserror::Error;

use crate::domain::InstrumentId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("instrument {id} has no liquidity entry from the coarse stage")]
    MissingLiquidity { id: InstrumentId },
}
