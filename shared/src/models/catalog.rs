//! Catalog Models — products and sellable packages

use serde::{Deserialize, Serialize};

/// Product entity (商品)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Package entity — a purchasable SKU with a base USD price
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Package {
    pub id: i64,
    pub tenant_id: i64,
    pub product_id: i64,
    pub name: String,
    /// Base sell price in USD
    pub base_price_usd: f64,
    /// Base cost in USD, the FX-freeze fallback when no provider/code cost
    /// was recorded for the order
    pub base_cost_usd: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-price-group USD price override for a package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PackagePriceOverride {
    pub package_id: i64,
    pub price_group_id: i64,
    pub price_usd: f64,
}
