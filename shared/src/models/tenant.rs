//! Tenant Model
//!
//! Tenant provisioning/management lives in the upstream admin surface;
//! the core only needs the home currency for the approval snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    /// Home currency for frozen sell/cost/profit reporting amounts
    pub home_currency: String,
    pub created_at: i64,
}
