//! Code Inventory Models
//!
//! A code group is a named batch of pre-purchased single-use codes.
//! A code item goes `available → used` exactly once and stays attached
//! to the consuming order forever.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum CodeStatus {
    Available,
    /// Set aside by an operator (e.g. pending review), not claimable
    Reserved,
    Used,
    Disabled,
}

/// Code group entity (卡密批次)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CodeGroup {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CodeGroupCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// Single-use redemption code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CodeItem {
    pub id: i64,
    pub tenant_id: i64,
    pub group_id: i64,
    pub pin: String,
    pub serial: Option<String>,
    /// Purchase cost of this code, USD
    pub cost_usd: f64,
    pub status: CodeStatus,
    /// Owning order once consumed — set exactly once
    pub order_id: Option<i64>,
    pub used_at: Option<i64>,
    pub created_at: i64,
}

/// Bulk import payload for a code group
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CodeImport {
    #[validate(length(min = 1, message = "at least one code required"))]
    pub codes: Vec<CodeImportItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeImportItem {
    pub pin: String,
    pub serial: Option<String>,
    pub cost_usd: f64,
}
