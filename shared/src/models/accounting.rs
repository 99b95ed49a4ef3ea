//! Accounting Period Model
//!
//! Per-tenant month flag. Once closed, orders whose approval date falls
//! in the month can no longer leave `approved`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PeriodStatus {
    Open,
    Closed,
}

/// Accounting period row, keyed by (tenant, year, month)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AccountingPeriod {
    pub tenant_id: i64,
    pub year: i64,
    pub month: i64,
    pub status: PeriodStatus,
    pub closed_at: Option<i64>,
    pub closed_by: Option<String>,
    pub note: Option<String>,
}
