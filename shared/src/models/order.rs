//! Order Model
//!
//! The order row carries three groups of state:
//! - the purchase itself (package, quantity, prices — immutable after creation)
//! - external dispatch tracking (provider, external reference, external status)
//! - the approval snapshot frozen at the moment the order is approved (订单审批快照)

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order lifecycle status.
///
/// `pending` is the only non-terminal state. `approved` and `rejected`
/// are terminal but administratively convertible into each other; that
/// toggle reverses/reapplies the wallet delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }
}

/// External dispatch status, advancing forward only:
/// `not_sent → sent → processing → {done, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ExternalStatus {
    NotSent,
    Sent,
    Processing,
    Done,
    Failed,
}

impl ExternalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExternalStatus::Done | ExternalStatus::Failed)
    }

    /// Forward-only ordering used by the reconciliation sweep so a stale
    /// provider answer can never move tracking backwards.
    fn rank(&self) -> u8 {
        match self {
            ExternalStatus::NotSent => 0,
            ExternalStatus::Sent => 1,
            ExternalStatus::Processing => 2,
            ExternalStatus::Done | ExternalStatus::Failed => 3,
        }
    }

    pub fn can_advance_to(&self, next: ExternalStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// Order entity (订单)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub tenant_id: i64,
    /// Human-facing order number, unique per tenant
    pub order_no: String,
    pub user_id: i64,
    pub product_id: i64,
    pub package_id: i64,
    pub quantity: i64,
    /// Unit price in USD, fixed at creation
    pub unit_price_usd: f64,
    /// quantity × unit price, USD, fixed at creation
    pub total_usd: f64,
    /// Total converted to the user's display currency at creation time;
    /// every wallet delta for this order uses exactly this amount
    pub total_user_ccy: f64,
    pub user_currency: String,
    pub status: OrderStatus,

    // ---- external dispatch ----
    pub provider_id: Option<i64>,
    pub external_ref: Option<String>,
    pub external_status: Option<ExternalStatus>,
    pub external_message: Option<String>,
    pub attempts: i64,
    pub sent_at: Option<i64>,
    pub last_sync_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub duration_ms: Option<i64>,

    // ---- authoritative cost, recorded from the placed-order response
    // (or the consumed code item) and preferred by the FX freeze ----
    pub cost_amount: Option<f64>,
    pub cost_currency: Option<String>,

    // ---- approval snapshot (FX freeze) ----
    pub fx_locked: bool,
    pub fx_rate: Option<f64>,
    pub sell_home: Option<f64>,
    pub cost_home: Option<f64>,
    pub profit_home: Option<f64>,
    pub approved_at: Option<i64>,
    /// Local calendar date of approval in the business time zone, `YYYY-MM-DD`
    pub approval_date: Option<String>,
    /// Local calendar month of approval, `YYYY-MM`
    pub approval_month: Option<String>,

    // ---- user-supplied fields ----
    pub player_id: Option<String>,
    pub extra_field: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    pub package_id: i64,
    #[validate(range(min = 1, message = "quantity must be a positive integer"))]
    pub quantity: i64,
    /// Optional user-supplied identifier forwarded to the provider (e.g. player ID)
    pub player_id: Option<String>,
    /// One free-form extra field (server name, region, ...)
    pub extra_field: Option<String>,
}

/// Append-only order note (author, text, time)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderNote {
    pub id: i64,
    pub order_id: i64,
    pub author: String,
    pub text: String,
    pub created_at: i64,
}

/// Note append payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderNoteCreate {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

/// Order view returned to clients (order + its notes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub notes: Vec<OrderNote>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_status_forward_only() {
        use ExternalStatus::*;
        assert!(NotSent.can_advance_to(Sent));
        assert!(Sent.can_advance_to(Processing));
        assert!(Sent.can_advance_to(Done));
        assert!(Processing.can_advance_to(Failed));
        assert!(!Done.can_advance_to(Processing));
        assert!(!Processing.can_advance_to(Sent));
        assert!(!Sent.can_advance_to(Sent));
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Approved.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }
}
