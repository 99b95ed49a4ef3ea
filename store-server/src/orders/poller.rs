//! Reconciliation Poller
//!
//! Periodic sweep over orders stuck in an in-flight external state
//! (`sent`/`processing` while still `pending`): re-queries the provider,
//! advances the external status forward-only, and drives terminal
//! answers into the state machine. A failure while polling one order is
//! logged and never aborts the rest of the batch.
//!
//! When the provider reports a terminal failure while the order is still
//! on its *primary* provider and a fallback is configured, the sweep
//! invokes the orchestrator's fallback attempt instead of rejecting —
//! the fallback path exists precisely for this case. Orders already on
//! the fallback (or without one) reject and refund.

use super::dispatch::DispatchOrchestrator;
use super::routing::{self, ResolvedRouting};
use super::service::{OrderError, OrderResult, OrderService};
use crate::db::repository::{dispatch_log, order as order_repo, provider as provider_repo};
use crate::providers::{AdapterFactory, MappedStatus, OrderCheck};
use shared::models::{
    DispatchAction, DispatchResult, ExternalStatus, Order, OrderStatus,
};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ReconciliationPoller {
    pool: SqlitePool,
    factory: Arc<dyn AdapterFactory>,
    orders: Arc<OrderService>,
    dispatcher: Arc<DispatchOrchestrator>,
    interval: Duration,
    batch_size: i64,
    shutdown: CancellationToken,
}

impl ReconciliationPoller {
    pub fn new(
        pool: SqlitePool,
        factory: Arc<dyn AdapterFactory>,
        orders: Arc<OrderService>,
        dispatcher: Arc<DispatchOrchestrator>,
        interval: Duration,
        batch_size: i64,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            factory,
            orders,
            dispatcher,
            interval,
            batch_size,
            shutdown,
        }
    }

    /// Main loop. Registered as a periodic background task.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            batch = self.batch_size,
            "Reconciliation poller started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reconciliation poller received shutdown signal");
                    break;
                }
            }
        }
        tracing::info!("Reconciliation poller stopped");
    }

    /// One sweep: select a bounded batch of in-flight orders, check each
    /// provider once for all of its orders, reconcile per order.
    pub async fn sweep(&self) {
        let batch = match order_repo::find_in_flight(&self.pool, self.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(error = %e, "Failed to select in-flight orders");
                return;
            }
        };
        if batch.is_empty() {
            return;
        }
        tracing::debug!(count = batch.len(), "Reconciling in-flight orders");

        // One check_orders call per (tenant, provider)
        let mut groups: HashMap<(i64, i64), Vec<Order>> = HashMap::new();
        for order in batch {
            if let Some(provider_id) = order.provider_id {
                groups
                    .entry((order.tenant_id, provider_id))
                    .or_default()
                    .push(order);
            }
        }

        for ((tenant_id, provider_id), orders) in groups {
            if let Err(e) = self.sweep_provider(tenant_id, provider_id, orders).await {
                tracing::error!(
                    tenant_id,
                    provider_id,
                    error = %e,
                    "Provider reconciliation batch failed"
                );
            }
        }
    }

    async fn sweep_provider(
        &self,
        tenant_id: i64,
        provider_id: i64,
        orders: Vec<Order>,
    ) -> OrderResult<()> {
        let provider = provider_repo::find_by_id(&self.pool, tenant_id, provider_id)
            .await?
            .ok_or_else(|| {
                OrderError::Dispatch(format!("provider {provider_id} not configured"))
            })?;
        let adapter = self
            .factory
            .adapter_for(&provider)
            .map_err(|e| OrderError::Dispatch(e.to_string()))?;

        let refs: Vec<String> = orders
            .iter()
            .filter_map(|o| o.external_ref.clone())
            .collect();
        let checks = adapter
            .check_orders(&refs)
            .await
            .map_err(|e| OrderError::Dispatch(e.to_string()))?;
        let by_ref: HashMap<&str, &OrderCheck> = checks
            .iter()
            .map(|c| (c.external_ref.as_str(), c))
            .collect();

        for order in &orders {
            let Some(external_ref) = order.external_ref.as_deref() else {
                continue;
            };
            let Some(check) = by_ref.get(external_ref) else {
                tracing::debug!(order_id = order.id, external_ref, "No check result for ref");
                continue;
            };
            if let Err(e) = self.reconcile_one(order, check).await {
                tracing::error!(order_id = order.id, error = %e, "Failed to reconcile order");
            }
        }
        Ok(())
    }

    /// Apply one check result. Reloads the order first so a race with the
    /// orchestrator or an administrator turns into a no-op.
    async fn reconcile_one(&self, stale: &Order, check: &OrderCheck) -> OrderResult<()> {
        let Some(order) = order_repo::find_by_id_any(&self.pool, stale.id).await? else {
            return Ok(());
        };
        // Idempotency guards: skip anything no longer in-flight
        if order.status != OrderStatus::Pending
            || order.provider_id.is_none()
            || order.external_ref.is_none()
            || order.external_status.map(|s| s.is_terminal()).unwrap_or(true)
        {
            return Ok(());
        }

        match check.mapped {
            MappedStatus::Pending => {
                // Forward-only: a stale answer can't move tracking back
                let next = check.mapped.after_check();
                let store = match order.external_status {
                    Some(current) if !current.can_advance_to(next) => current,
                    _ => next,
                };
                order_repo::record_check(&self.pool, order.id, store, check.message.as_deref())
                    .await?;
                Ok(())
            }
            MappedStatus::Success => self.finish_success(&order, check).await,
            MappedStatus::Failed => self.finish_failure(&order, check).await,
        }
    }

    async fn finish_success(&self, order: &Order, check: &OrderCheck) -> OrderResult<()> {
        order_repo::complete_external(
            &self.pool,
            order.id,
            ExternalStatus::Done,
            check.message.as_deref(),
        )
        .await?;
        if let Some(code) = &check.redemption_code {
            order_repo::add_note(
                &self.pool,
                order.id,
                "system",
                &format!("Redemption code: {code}"),
            )
            .await?;
        }
        self.log_check(order, DispatchResult::Success, &check.raw_status)
            .await;
        self.orders
            .update_status(order.tenant_id, order.id, OrderStatus::Approved, "reconciler")
            .await?;
        tracing::info!(order_id = order.id, "Order reconciled to approved");
        Ok(())
    }

    async fn finish_failure(&self, order: &Order, check: &OrderCheck) -> OrderResult<()> {
        let routing = routing::resolve(&self.pool, order.tenant_id, order.package_id).await?;
        let primary_with_fallback = matches!(
            routing,
            ResolvedRouting::External {
                primary: Some(p),
                fallback: Some(f),
            } if order.provider_id == Some(p) && p != f
        );

        let message = format!(
            "{} ({})",
            check.raw_status,
            check.message.as_deref().unwrap_or("-")
        );
        self.log_check(order, DispatchResult::Fail, &message).await;

        if primary_with_fallback {
            tracing::info!(
                order_id = order.id,
                "Primary provider failed, invoking fallback dispatch"
            );
            self.dispatcher
                .dispatch_fallback(order.tenant_id, order.id)
                .await
        } else {
            order_repo::complete_external(
                &self.pool,
                order.id,
                ExternalStatus::Failed,
                Some(&message),
            )
            .await?;
            self.orders
                .update_status(order.tenant_id, order.id, OrderStatus::Rejected, "reconciler")
                .await?;
            tracing::warn!(order_id = order.id, message, "Order reconciled to rejected");
            Ok(())
        }
    }

    async fn log_check(&self, order: &Order, result: DispatchResult, message: &str) {
        if let Err(e) = dispatch_log::append(
            &self.pool,
            order.tenant_id,
            order.id,
            order.provider_id,
            DispatchAction::CheckStatus,
            result,
            message,
            None,
        )
        .await
        {
            tracing::error!(order_id = order.id, error = %e, "Failed to append dispatch log");
        }
    }
}
