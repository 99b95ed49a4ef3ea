//! User Model
//!
//! End users hold a prepaid wallet: `balance` may go negative down to
//! `-overdraft_limit`. Every wallet mutation is a single guarded SQL
//! increment, never read-modify-write.

use serde::{Deserialize, Serialize};

/// User entity (用户/钱包)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub tenant_id: i64,
    pub username: String,
    pub display_name: String,
    /// Display currency for wallet amounts (ISO code, e.g. "THB")
    pub currency_code: String,
    /// Optional price group granting per-package USD price overrides
    pub price_group_id: Option<i64>,
    /// Wallet balance in the user's display currency
    pub balance: f64,
    /// How far below zero the balance may go
    pub overdraft_limit: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
