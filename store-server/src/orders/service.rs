//! OrderService - order state machine and wallet ledger
//!
//! This module handles:
//! - Checkout: price computation, wallet debit and order insert in one
//!   transaction
//! - Administrative status transitions (approve/reject toggle) with the
//!   accounting-period guard and the overdraft re-check
//! - The FX freeze trigger on entry to `approved`
//! - One fire-and-forget outcome notification per transition
//!
//! # Wallet deltas
//!
//! Creation debits the wallet once; every later transition applies the
//! stored `total_user_ccy` so the deltas for an order always net out to
//! exactly one debit (final status approved) or zero (final status
//! rejected):
//!
//! ```text
//! create               -> -total
//! pending  -> approved ->  0        (already debited at creation)
//! pending  -> rejected -> +total    (refund)
//! approved -> rejected -> +total    (refund)
//! rejected -> approved -> -total    (re-debit, overdraft re-checked)
//! ```

use super::{fx, money};
use crate::db::repository::{
    RepoError, catalog, currency, order as order_repo, user as user_repo,
};
use crate::services::{NotificationService, StatusNotification};
use crate::utils::AppError;
use chrono_tz::Tz;
use shared::models::{Order, OrderCreate, OrderStatus, OrderView};
use sqlx::SqlitePool;
use thiserror::Error;

/// Order core errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("User not found or inactive")]
    UserNotFound,

    #[error("Package not found: {0}")]
    PackageNotFound(i64),

    #[error("Product not found or inactive: {0}")]
    ProductNotFound(i64),

    #[error("Tenant not found: {0}")]
    TenantNotFound(i64),

    #[error("No exchange rate configured for currency: {0}")]
    CurrencyMissing(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Insufficient balance: need {need}, available {available}")]
    InsufficientBalance { need: f64, available: f64 },

    #[error("Overdraft limit exceeded for re-approval")]
    OverdraftExceeded,

    #[error("Accounting period {0} is closed")]
    PeriodClosed(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => AppError::NotFound(format!("Order {id}")),
            OrderError::UserNotFound => AppError::NotFound("User".into()),
            OrderError::PackageNotFound(id) => AppError::NotFound(format!("Package {id}")),
            OrderError::ProductNotFound(id) => AppError::NotFound(format!("Product {id}")),
            OrderError::TenantNotFound(id) => AppError::NotFound(format!("Tenant {id}")),
            OrderError::CurrencyMissing(code) => {
                AppError::BusinessRule(format!("No exchange rate for {code}"))
            }
            OrderError::InvalidQuantity(q) => {
                AppError::Validation(format!("Invalid quantity: {q}"))
            }
            e @ OrderError::InsufficientBalance { .. } => {
                AppError::InsufficientBalance(e.to_string())
            }
            e @ OrderError::OverdraftExceeded => AppError::OverdraftExceeded(e.to_string()),
            OrderError::PeriodClosed(month) => {
                AppError::PeriodClosed(format!("Accounting period {month} is closed"))
            }
            OrderError::InvalidTransition(msg) => AppError::BusinessRule(msg),
            OrderError::Dispatch(msg) => AppError::Internal(msg),
            OrderError::Internal(msg) => AppError::Internal(msg),
            OrderError::Repo(RepoError::NotFound(msg)) => AppError::NotFound(msg),
            OrderError::Repo(RepoError::Duplicate(msg)) => AppError::Conflict(msg),
            OrderError::Repo(RepoError::Validation(msg)) => AppError::Validation(msg),
            OrderError::Repo(RepoError::Database(msg)) => AppError::Database(msg),
        }
    }
}

/// Order state machine + wallet ledger
#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    tz: Tz,
    notifications: NotificationService,
}

impl OrderService {
    pub fn new(pool: SqlitePool, tz: Tz, notifications: NotificationService) -> Self {
        Self {
            pool,
            tz,
            notifications,
        }
    }

    /// Load an order with its notes.
    pub async fn view(&self, tenant_id: i64, order_id: i64) -> OrderResult<OrderView> {
        let order = order_repo::find_by_id(&self.pool, tenant_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        let notes = order_repo::notes_for(&self.pool, order_id).await?;
        Ok(OrderView { order, notes })
    }

    /// Checkout: price the package, convert to the user's display
    /// currency, then atomically debit the wallet and insert the order.
    ///
    /// Dispatch is NOT triggered here — the caller fires the orchestrator
    /// after this returns, so a dispatch failure can never roll back an
    /// accepted order.
    pub async fn create_order(
        &self,
        tenant_id: i64,
        user_id: i64,
        req: OrderCreate,
    ) -> OrderResult<OrderView> {
        // 1. Validate quantity
        if req.quantity < 1 {
            return Err(OrderError::InvalidQuantity(req.quantity));
        }

        // 2. Load an active user and package
        let user = user_repo::find_by_id(&self.pool, tenant_id, user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(OrderError::UserNotFound)?;

        let package = catalog::find_package(&self.pool, tenant_id, req.package_id)
            .await?
            .ok_or(OrderError::PackageNotFound(req.package_id))?;
        catalog::find_product(&self.pool, tenant_id, package.product_id)
            .await?
            .ok_or(OrderError::ProductNotFound(package.product_id))?;

        // 3. Unit price: price-group override wins over the base price
        let unit_price_usd = match user.price_group_id {
            Some(group) => catalog::find_price_override(&self.pool, package.id, group)
                .await?
                .unwrap_or(package.base_price_usd),
            None => package.base_price_usd,
        };
        let total_usd = money::line_total(unit_price_usd, req.quantity);

        // 4. Convert to the user's display currency at the current rate
        let rate = currency::find_rate(&self.pool, tenant_id, &user.currency_code)
            .await?
            .ok_or_else(|| OrderError::CurrencyMissing(user.currency_code.clone()))?;
        let total_user_ccy = money::usd_to(total_usd, rate);

        // 5. Atomically: debit wallet + insert order
        let now = shared::util::now_millis();
        let id = shared::util::snowflake_id();
        let order = Order {
            id,
            tenant_id,
            order_no: shared::util::order_no(id),
            user_id,
            product_id: package.product_id,
            package_id: package.id,
            quantity: req.quantity,
            unit_price_usd,
            total_usd,
            total_user_ccy,
            user_currency: user.currency_code.clone(),
            status: OrderStatus::Pending,
            provider_id: None,
            external_ref: None,
            external_status: None,
            external_message: None,
            attempts: 0,
            sent_at: None,
            last_sync_at: None,
            completed_at: None,
            duration_ms: None,
            cost_amount: None,
            cost_currency: None,
            fx_locked: false,
            fx_rate: None,
            sell_home: None,
            cost_home: None,
            profit_home: None,
            approved_at: None,
            approval_date: None,
            approval_month: None,
            player_id: req.player_id,
            extra_field: req.extra_field,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let debited = user_repo::debit(&mut *tx, tenant_id, user_id, total_user_ccy).await?;
        if !debited {
            // Guard clause failed — no partial state to undo
            tx.rollback().await.map_err(RepoError::from)?;
            return Err(OrderError::InsufficientBalance {
                need: total_user_ccy,
                available: money::round2(user.balance + user.overdraft_limit),
            });
        }
        order_repo::insert(&mut *tx, &order).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id = order.id,
            order_no = %order.order_no,
            tenant_id,
            user_id,
            total_usd,
            total_user_ccy,
            currency = %order.user_currency,
            "Order created, wallet debited"
        );

        Ok(OrderView {
            order,
            notes: Vec::new(),
        })
    }

    /// Administrative / system status transition.
    ///
    /// Allowed: `pending → approved|rejected`, `approved ↔ rejected`.
    /// Everything else (including any move back to `pending`) is
    /// rejected without touching state.
    pub async fn update_status(
        &self,
        tenant_id: i64,
        order_id: i64,
        new_status: OrderStatus,
        operator: &str,
    ) -> OrderResult<OrderView> {
        // 1. Load and short-circuit no-ops
        let order = order_repo::find_by_id(&self.pool, tenant_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        let old_status = order.status;
        if new_status == old_status {
            return self.view(tenant_id, order_id).await;
        }

        // 2. Transition table
        let allowed = matches!(
            (old_status, new_status),
            (OrderStatus::Pending, OrderStatus::Approved)
                | (OrderStatus::Pending, OrderStatus::Rejected)
                | (OrderStatus::Approved, OrderStatus::Rejected)
                | (OrderStatus::Rejected, OrderStatus::Approved)
        );
        if !allowed {
            return Err(OrderError::InvalidTransition(format!(
                "{} -> {}",
                old_status.as_str(),
                new_status.as_str()
            )));
        }

        // 3. Closed-period guard: an approved order whose frozen approval
        // date falls in a closed month must stay approved
        if old_status == OrderStatus::Approved
            && let Some(date) = order.approval_date.as_deref()
            && super::accounting::is_closed_for_date(&self.pool, tenant_id, date).await?
        {
            return Err(OrderError::PeriodClosed(date[..7].to_string()));
        }

        // 4. Apply the wallet delta and the row update atomically
        let mut wallet_delta = 0.0;
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        match (old_status, new_status) {
            (OrderStatus::Rejected, OrderStatus::Approved) => {
                // Re-debit after a refund: the overdraft ceiling is
                // re-checked by the guarded UPDATE
                let debited =
                    user_repo::debit(&mut *tx, tenant_id, order.user_id, order.total_user_ccy)
                        .await?;
                if !debited {
                    tx.rollback().await.map_err(RepoError::from)?;
                    return Err(OrderError::OverdraftExceeded);
                }
                wallet_delta = -order.total_user_ccy;
            }
            (_, OrderStatus::Rejected) => {
                user_repo::credit(&mut *tx, tenant_id, order.user_id, order.total_user_ccy)
                    .await?;
                wallet_delta = order.total_user_ccy;
            }
            // pending -> approved: wallet was already debited at creation
            _ => {}
        }

        order_repo::set_status(&mut *tx, order_id, new_status).await?;

        // Leaving `approved` clears the frozen snapshot
        if old_status == OrderStatus::Approved {
            order_repo::clear_fx_snapshot(&mut *tx, order_id).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id,
            tenant_id,
            old = old_status.as_str(),
            new = new_status.as_str(),
            wallet_delta,
            operator,
            "Order status changed"
        );

        // 5. Entering `approved` freezes the snapshot (idempotent)
        if new_status == OrderStatus::Approved
            && let Err(e) = fx::freeze(&self.pool, self.tz, tenant_id, order_id).await
        {
            tracing::error!(order_id, error = %e, "FX freeze failed after approval");
        }

        // 6. Single outcome notification, fire-and-forget
        self.notify(&order, old_status, new_status, wallet_delta);

        self.view(tenant_id, order_id).await
    }

    /// Post-approval hook for transitions performed outside
    /// [`update_status`] (the orchestrator's same-transaction code path):
    /// freezes the snapshot and emits the notification.
    pub async fn post_approval(&self, tenant_id: i64, order_id: i64, old_status: OrderStatus) {
        if let Err(e) = fx::freeze(&self.pool, self.tz, tenant_id, order_id).await {
            tracing::error!(order_id, error = %e, "FX freeze failed after approval");
        }
        match order_repo::find_by_id(&self.pool, tenant_id, order_id).await {
            Ok(Some(order)) => self.notify(&order, old_status, OrderStatus::Approved, 0.0),
            Ok(None) => {}
            Err(e) => tracing::error!(order_id, error = %e, "Failed to reload order for notify"),
        }
    }

    /// Append a diagnostic note. Allowed in any status — terminal orders
    /// freeze dispatch fields, not notes.
    pub async fn add_note(
        &self,
        tenant_id: i64,
        order_id: i64,
        author: &str,
        text: &str,
    ) -> OrderResult<OrderView> {
        let order = order_repo::find_by_id(&self.pool, tenant_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        order_repo::add_note(&self.pool, order.id, author, text).await?;
        self.view(tenant_id, order_id).await
    }

    fn notify(
        &self,
        order: &Order,
        old_status: OrderStatus,
        new_status: OrderStatus,
        wallet_delta: f64,
    ) {
        self.notifications.emit(StatusNotification {
            tenant_id: order.tenant_id,
            order_id: order.id,
            order_no: order.order_no.clone(),
            user_id: order.user_id,
            old_status,
            new_status,
            wallet_delta,
            at: shared::util::now_millis(),
        });
    }
}
