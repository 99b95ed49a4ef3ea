//! Dispatch Log Model
//!
//! Append-only audit trail of every fulfillment attempt: which provider
//! (or code group) was tried, the outcome, and a redacted request/response
//! snapshot for debugging. Never updated or deleted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum DispatchAction {
    PlaceOrder,
    ConsumeCode,
    CheckStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum DispatchResult {
    Success,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DispatchLog {
    pub id: i64,
    pub tenant_id: i64,
    pub order_id: i64,
    pub provider_id: Option<i64>,
    pub action: DispatchAction,
    pub result: DispatchResult,
    pub message: String,
    /// Redacted request/response snapshot (JSON), secrets already masked
    pub snapshot: Option<String>,
    pub created_at: i64,
}
