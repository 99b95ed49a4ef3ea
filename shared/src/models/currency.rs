//! Currency Model — exchange rates keyed by ISO code
//!
//! Rates are stored as "units of this currency per 1 USD". The currency
//! table itself is maintained by an external admin surface; the core only
//! reads it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Currency {
    pub tenant_id: i64,
    /// ISO code, e.g. "USD", "THB"
    pub code: String,
    /// Units per 1 USD
    pub rate_per_usd: f64,
    pub updated_at: i64,
}
