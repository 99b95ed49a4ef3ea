//! Provider Models
//!
//! A provider row configures one external fulfillment integration. The
//! `kind` selects the concrete adapter (wire format + auth scheme); the
//! core never sees provider-specific formats.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum ProviderKind {
    /// Query-string-signed API answering with `;`-delimited text
    Voltpin,
    /// Bearer-token JSON REST API
    Orbitpay,
    /// In-process adapter for tests and dry runs
    Mock,
}

/// Provider entity (供应商)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Provider {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: String,
    pub api_secret: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per (package, provider) mapping: the provider-side product reference
/// plus the last cost quote cached from the provider catalog.
///
/// The cached cost is a display/estimation aid only — the authoritative
/// cost for profit computation comes from the actual placed-order
/// response recorded on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProviderCost {
    pub package_id: i64,
    pub provider_id: i64,
    pub tenant_id: i64,
    /// Product reference on the provider side
    pub product_ref: String,
    pub cost_amount: Option<f64>,
    pub cost_currency: Option<String>,
    pub refreshed_at: Option<i64>,
}
