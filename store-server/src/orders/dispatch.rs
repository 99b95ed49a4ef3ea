//! Dispatch Orchestrator
//!
//! Invoked once, right after checkout, while the order is still pending
//! with no provider attached (re-invocation is a no-op). Resolves the
//! package routing and attempts fulfillment:
//!
//! 1. internal codes — claim the oldest available code and approve the
//!    order in the same transaction
//! 2. external — primary provider, then the fallback, with the order ID
//!    as the idempotency key on every call
//! 3. both failed — external status `failed`, order rejected (refund)
//!
//! Every attempt lands in the append-only dispatch log. Snapshots stored
//! there carry only request/response identifiers, never credentials or
//! PINs (the PIN goes to the order notes, visible to the buyer).

use super::routing::{self, ResolvedRouting};
use super::service::{OrderError, OrderResult, OrderService};
use crate::db::repository::{
    RepoError, code, dispatch_log, order as order_repo, provider as provider_repo,
};
use crate::providers::{AdapterFactory, MappedStatus, PlaceOrder};
use shared::models::{
    DispatchAction, DispatchResult, ExternalStatus, Order, OrderStatus,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

pub struct DispatchOrchestrator {
    pool: SqlitePool,
    factory: Arc<dyn AdapterFactory>,
    orders: Arc<OrderService>,
    /// Backoff before the single transport-level retry per provider
    retry_backoff_ms: u64,
}

impl DispatchOrchestrator {
    pub fn new(
        pool: SqlitePool,
        factory: Arc<dyn AdapterFactory>,
        orders: Arc<OrderService>,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            pool,
            factory,
            orders,
            retry_backoff_ms,
        }
    }

    /// Fulfillment entry point. Idempotent: a second invocation on an
    /// order that is no longer pending, or that already has a provider or
    /// external reference, does nothing.
    pub async fn dispatch(&self, tenant_id: i64, order_id: i64) -> OrderResult<()> {
        let order = order_repo::find_by_id(&self.pool, tenant_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Pending
            || order.provider_id.is_some()
            || order.external_ref.is_some()
        {
            tracing::debug!(order_id, "Dispatch skipped (already dispatched or terminal)");
            return Ok(());
        }

        match routing::resolve(&self.pool, tenant_id, order.package_id).await? {
            ResolvedRouting::Manual => {
                tracing::debug!(order_id, "No automated routing, order left pending");
                Ok(())
            }
            ResolvedRouting::InternalCodes { code_group_id } => {
                self.fulfill_from_codes(&order, code_group_id).await
            }
            ResolvedRouting::External { primary, fallback } => {
                self.fulfill_external(&order, primary, fallback).await
            }
        }
    }

    /// Fallback-only entry point, used by the reconciliation sweep when
    /// the primary provider reported a terminal failure for an order that
    /// still has a fallback to try.
    pub async fn dispatch_fallback(&self, tenant_id: i64, order_id: i64) -> OrderResult<()> {
        let order = order_repo::find_by_id(&self.pool, tenant_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Pending {
            return Ok(());
        }

        let routing = routing::resolve(&self.pool, tenant_id, order.package_id).await?;
        let ResolvedRouting::External {
            fallback: Some(fallback),
            ..
        } = routing
        else {
            return self.fail_order(&order, "no fallback provider configured").await;
        };
        if order.provider_id == Some(fallback) {
            return self.fail_order(&order, "fallback provider already failed").await;
        }

        match self.try_provider(&order, fallback).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.fail_order(&order, &format!("fallback attempt failed: {e}"))
                    .await
            }
        }
    }

    // ========================================================================
    // Internal codes
    // ========================================================================

    /// Claim one code and approve the order in a single transaction. The
    /// claim is an atomic UPDATE over the oldest available row, so two
    /// concurrent dispatches can never take the same code.
    async fn fulfill_from_codes(&self, order: &Order, code_group_id: i64) -> OrderResult<()> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let claimed =
            code::claim_oldest_available(&mut *tx, order.tenant_id, code_group_id, order.id)
                .await?;

        let Some(item) = claimed else {
            tx.rollback().await.map_err(RepoError::from)?;
            self.log_attempt(
                order,
                None,
                DispatchAction::ConsumeCode,
                DispatchResult::Fail,
                &format!("no codes available in group {code_group_id}"),
                None,
            )
            .await;
            tracing::warn!(
                order_id = order.id,
                code_group_id,
                "Code group exhausted, order left pending for manual handling"
            );
            return Ok(());
        };

        let note = match &item.serial {
            Some(serial) => format!("Code: {} (serial {serial})", item.pin),
            None => format!("Code: {}", item.pin),
        };
        order_repo::add_note(&mut *tx, order.id, "system", &note).await?;
        order_repo::set_cost(&mut *tx, order.id, item.cost_usd, "USD").await?;
        order_repo::set_status(&mut *tx, order.id, OrderStatus::Approved).await?;
        tx.commit().await.map_err(RepoError::from)?;

        self.log_attempt(
            order,
            None,
            DispatchAction::ConsumeCode,
            DispatchResult::Success,
            "code consumed",
            Some(serde_json::json!({
                "code_group_id": code_group_id,
                "code_id": item.id,
                "serial": item.serial,
            })),
        )
        .await;

        tracing::info!(
            order_id = order.id,
            code_id = item.id,
            "Order fulfilled from code inventory"
        );

        self.orders
            .post_approval(order.tenant_id, order.id, OrderStatus::Pending)
            .await;
        Ok(())
    }

    // ========================================================================
    // External providers
    // ========================================================================

    async fn fulfill_external(
        &self,
        order: &Order,
        primary: Option<i64>,
        fallback: Option<i64>,
    ) -> OrderResult<()> {
        let mut last_error = String::from("no provider configured");
        for provider_id in [primary, fallback].into_iter().flatten() {
            match self.try_provider(order, provider_id).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        order_id = order.id,
                        provider_id,
                        error = %e,
                        "Provider attempt failed"
                    );
                    last_error = e.to_string();
                }
            }
        }
        self.fail_order(order, &last_error).await
    }

    /// One provider attempt: mapping lookup, place-order call (with a
    /// single bounded retry on transport errors), result recording.
    ///
    /// An `Err` means "this provider did not take the order" — the caller
    /// decides whether a fallback remains.
    async fn try_provider(&self, order: &Order, provider_id: i64) -> OrderResult<()> {
        // Provider row + package mapping
        let Some(provider) =
            provider_repo::find_by_id(&self.pool, order.tenant_id, provider_id).await?
        else {
            let msg = format!("provider {provider_id} not configured or inactive");
            self.log_place_fail(order, Some(provider_id), &msg, None).await;
            return Err(OrderError::Dispatch(msg));
        };

        let Some(mapping) =
            provider_repo::find_mapping(&self.pool, order.package_id, provider_id).await?
        else {
            let msg = format!(
                "package {} has no mapping for provider {}",
                order.package_id, provider_id
            );
            self.log_place_fail(order, Some(provider_id), &msg, None).await;
            return Err(OrderError::Dispatch(msg));
        };

        let adapter = match self.factory.adapter_for(&provider) {
            Ok(a) => a,
            Err(e) => {
                let msg = format!("adapter construction failed: {e}");
                self.log_place_fail(order, Some(provider_id), &msg, None).await;
                return Err(OrderError::Dispatch(msg));
            }
        };

        order_repo::incr_attempts(&self.pool, order.id).await?;

        let request = PlaceOrder {
            product_ref: mapping.product_ref.clone(),
            quantity: order.quantity,
            player_id: order.player_id.clone(),
            extra_field: order.extra_field.clone(),
            // Deterministic key: retries and crashed re-dispatches can
            // never create a duplicate external order
            idempotency_key: order.id.to_string(),
        };
        let request_snapshot = serde_json::json!({
            "product_ref": request.product_ref,
            "quantity": request.quantity,
            "idempotency_key": request.idempotency_key,
        });

        let mut result = adapter.place_order(&request).await;
        if let Err(e) = &result
            && e.is_retryable()
        {
            tracing::warn!(order_id = order.id, provider_id, error = %e, "Retrying place_order");
            tokio::time::sleep(Duration::from_millis(self.retry_backoff_ms)).await;
            result = adapter.place_order(&request).await;
        }

        let placed = match result {
            Ok(placed) => placed,
            Err(e) => {
                self.log_place_fail(order, Some(provider_id), &e.to_string(), Some(&request_snapshot))
                    .await;
                return Err(OrderError::Dispatch(e.to_string()));
            }
        };

        if placed.mapped == MappedStatus::Failed {
            let msg = format!(
                "provider reported immediate failure: {} ({})",
                placed.raw_status,
                placed.message.as_deref().unwrap_or("-")
            );
            self.log_place_fail(order, Some(provider_id), &msg, Some(&request_snapshot))
                .await;
            return Err(OrderError::Dispatch(msg));
        }

        // Record the placement; an immediate terminal success approves in
        // the same transaction
        let external_status = placed.mapped.after_placement();
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        order_repo::apply_external_placement(
            &mut *tx,
            order.id,
            provider.id,
            &placed.external_ref,
            external_status,
            placed.message.as_deref(),
            placed.price,
            placed.currency.as_deref(),
        )
        .await?;
        if external_status == ExternalStatus::Done {
            order_repo::complete_external(&mut *tx, order.id, ExternalStatus::Done, None).await?;
            order_repo::set_status(&mut *tx, order.id, OrderStatus::Approved).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;

        self.log_attempt(
            order,
            Some(provider.id),
            DispatchAction::PlaceOrder,
            DispatchResult::Success,
            &format!("placed as {} ({})", placed.external_ref, placed.raw_status),
            Some(serde_json::json!({
                "request": request_snapshot,
                "external_ref": placed.external_ref,
                "raw_status": placed.raw_status,
            })),
        )
        .await;

        tracing::info!(
            order_id = order.id,
            provider_id = provider.id,
            external_ref = %placed.external_ref,
            status = ?external_status,
            "Order dispatched to provider"
        );

        if external_status == ExternalStatus::Done {
            self.orders
                .post_approval(order.tenant_id, order.id, OrderStatus::Pending)
                .await;
        }
        Ok(())
    }

    /// Terminal dispatch failure: stamp the external state and reject the
    /// order, refunding the wallet through the state machine.
    async fn fail_order(&self, order: &Order, message: &str) -> OrderResult<()> {
        order_repo::complete_external(&self.pool, order.id, ExternalStatus::Failed, Some(message))
            .await?;
        self.orders
            .update_status(order.tenant_id, order.id, OrderStatus::Rejected, "dispatcher")
            .await?;
        tracing::warn!(order_id = order.id, message, "Dispatch failed, order rejected");
        Ok(())
    }

    // ========================================================================
    // Dispatch log
    // ========================================================================

    async fn log_place_fail(
        &self,
        order: &Order,
        provider_id: Option<i64>,
        message: &str,
        snapshot: Option<&serde_json::Value>,
    ) {
        self.log_attempt(
            order,
            provider_id,
            DispatchAction::PlaceOrder,
            DispatchResult::Fail,
            message,
            snapshot.cloned(),
        )
        .await;
    }

    /// Append to the audit trail; logging failures must never affect the
    /// dispatch outcome.
    async fn log_attempt(
        &self,
        order: &Order,
        provider_id: Option<i64>,
        action: DispatchAction,
        result: DispatchResult,
        message: &str,
        snapshot: Option<serde_json::Value>,
    ) {
        if let Err(e) = dispatch_log::append(
            &self.pool,
            order.tenant_id,
            order.id,
            provider_id,
            action,
            result,
            message,
            snapshot.as_ref(),
        )
        .await
        {
            tracing::error!(order_id = order.id, error = %e, "Failed to append dispatch log");
        }
    }
}
