//! Provider Adapters
//!
//! Normalizes heterogeneous external voucher/top-up APIs into one
//! contract. Each concrete adapter owns its wire format (signing,
//! response grammar) and a single status-conversion table into the shared
//! three-way [`MappedStatus`]; nothing provider-specific leaks past this
//! module.
//!
//! Malformed, HTML or unknown responses raise a descriptive
//! [`AdapterError`] — callers treat adapter errors as dispatch/
//! reconciliation failures, never as terminal order failures by
//! themselves.

pub mod mock;
pub mod orbitpay;
pub mod registry;
pub mod voltpin;

pub use mock::{MockAdapter, MockFactory};
pub use orbitpay::OrbitPay;
pub use registry::ProviderRegistry;
pub use voltpin::VoltPin;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{ExternalStatus, Provider};
use std::sync::Arc;
use thiserror::Error;

/// Three-way normalized provider status. 每个 adapter 自己负责把
/// 供应商状态码翻译成这三种。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappedStatus {
    Pending,
    Success,
    Failed,
}

impl MappedStatus {
    /// External-status value after a placement response.
    pub fn after_placement(&self) -> ExternalStatus {
        match self {
            MappedStatus::Pending => ExternalStatus::Sent,
            MappedStatus::Success => ExternalStatus::Done,
            MappedStatus::Failed => ExternalStatus::Failed,
        }
    }

    /// External-status value after a status check.
    pub fn after_check(&self) -> ExternalStatus {
        match self {
            MappedStatus::Pending => ExternalStatus::Processing,
            MappedStatus::Success => ExternalStatus::Done,
            MappedStatus::Failed => ExternalStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Unknown provider status: {0}")]
    UnknownStatus(String),

    #[error("Provider error {code}: {message}")]
    Provider { code: String, message: String },

    #[error("Adapter configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    /// Transport-level failures are safe to retry with the same
    /// idempotency key; everything else is a definitive answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Transport(_))
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        AdapterError::Transport(e.to_string())
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderBalance {
    pub amount: f64,
    pub currency: String,
}

/// One catalog entry from a provider listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProduct {
    pub product_ref: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub available: bool,
    pub min_qty: i64,
    pub max_qty: i64,
    /// Input parameters the provider requires (e.g. "player_id")
    pub required_fields: Vec<String>,
}

/// Normalized place-order request.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrder {
    pub product_ref: String,
    pub quantity: i64,
    pub player_id: Option<String>,
    pub extra_field: Option<String>,
    /// Deterministic client reference (the order ID) so a retried call
    /// can never create a duplicate external order
    pub idempotency_key: String,
}

/// Normalized place-order response.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub external_ref: String,
    pub raw_status: String,
    pub mapped: MappedStatus,
    pub message: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Normalized per-reference status check result.
#[derive(Debug, Clone)]
pub struct OrderCheck {
    pub external_ref: String,
    pub raw_status: String,
    pub mapped: MappedStatus,
    pub message: Option<String>,
    /// Redemption code extracted from the response, if the provider
    /// delivers one on completion
    pub redemption_code: Option<String>,
}

/// Capability interface implemented once per external integration.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn get_balance(&self) -> AdapterResult<ProviderBalance>;
    async fn list_products(&self) -> AdapterResult<Vec<ProviderProduct>>;
    async fn place_order(&self, req: &PlaceOrder) -> AdapterResult<PlacedOrder>;
    async fn check_orders(&self, refs: &[String]) -> AdapterResult<Vec<OrderCheck>>;
}

/// Builds an adapter from a provider configuration row. The production
/// implementation is [`ProviderRegistry`]; tests inject [`MockFactory`].
pub trait AdapterFactory: Send + Sync {
    fn adapter_for(&self, provider: &Provider) -> AdapterResult<Arc<dyn ProviderAdapter>>;
}
