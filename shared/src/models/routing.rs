//! Routing Configuration Model
//!
//! One row per package, deciding how orders for that package are
//! fulfilled. Writes normalize the row (see `RoutingUpdate`): selecting
//! internal codes clears the provider IDs, selecting external clears the
//! code group, manual clears everything.

use serde::{Deserialize, Serialize};

/// `manual` means no automated dispatch; `auto` is computed from the
/// fulfillment targets, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum RoutingMode {
    Manual,
    Auto,
}

/// Fulfillment strategy for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum FulfillmentType {
    /// A human resolves the order out of band
    Manual,
    /// Consume one pre-purchased code from a code group
    InternalCodes,
    /// Place the order with an external provider (primary, then fallback)
    External,
}

/// Routing configuration row (路由配置)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RoutingConfig {
    pub package_id: i64,
    pub tenant_id: i64,
    pub mode: RoutingMode,
    pub fulfillment: FulfillmentType,
    pub primary_provider_id: Option<i64>,
    pub fallback_provider_id: Option<i64>,
    pub code_group_id: Option<i64>,
    pub updated_at: i64,
}

/// Routing write payload. The server normalizes the stored row from the
/// fulfillment type; fields irrelevant to the chosen type are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingUpdate {
    pub fulfillment: FulfillmentType,
    pub primary_provider_id: Option<i64>,
    pub fallback_provider_id: Option<i64>,
    pub code_group_id: Option<i64>,
}
