//! Order Repository
//!
//! Row-level reads and targeted single-statement updates. Functions are
//! generic over the executor so the order core can run them inside its
//! own transactions (`&mut *tx`) or straight on the pool. The service
//! layer owns all transaction boundaries and business rules.

use super::RepoResult;
use shared::models::{ExternalStatus, Order, OrderNote, OrderStatus};
use sqlx::Sqlite;

pub async fn insert<'e, E>(exec: E, order: &Order) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO orders (\
            id, tenant_id, order_no, user_id, product_id, package_id, quantity, \
            unit_price_usd, total_usd, total_user_ccy, user_currency, status, \
            attempts, player_id, extra_field, fx_locked, created_at, updated_at\
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, 0, ?, ?)",
    )
    .bind(order.id)
    .bind(order.tenant_id)
    .bind(&order.order_no)
    .bind(order.user_id)
    .bind(order.product_id)
    .bind(order.package_id)
    .bind(order.quantity)
    .bind(order.unit_price_usd)
    .bind(order.total_usd)
    .bind(order.total_user_ccy)
    .bind(&order.user_currency)
    .bind(order.status)
    .bind(&order.player_id)
    .bind(&order.extra_field)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E>(exec: E, tenant_id: i64, id: i64) -> RepoResult<Option<Order>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(exec)
        .await?;
    Ok(row)
}

/// Cross-tenant lookup, used by the background sweep.
pub async fn find_by_id_any<'e, E>(exec: E, id: i64) -> RepoResult<Option<Order>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(row)
}

pub async fn list_for_user(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    user_id: i64,
    status: Option<OrderStatus>,
    limit: i64,
) -> RepoResult<Vec<Order>> {
    let rows = match status {
        Some(s) => {
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE tenant_id = ? AND user_id = ? AND status = ? \
                 ORDER BY id DESC LIMIT ?",
            )
            .bind(tenant_id)
            .bind(user_id)
            .bind(s)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE tenant_id = ? AND user_id = ? \
                 ORDER BY id DESC LIMIT ?",
            )
            .bind(tenant_id)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

pub async fn admin_list(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    status: Option<OrderStatus>,
    limit: i64,
) -> RepoResult<Vec<Order>> {
    let rows = match status {
        Some(s) => {
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE tenant_id = ? AND status = ? \
                 ORDER BY id DESC LIMIT ?",
            )
            .bind(tenant_id)
            .bind(s)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE tenant_id = ? ORDER BY id DESC LIMIT ?",
            )
            .bind(tenant_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// Cursor-paginated admin listing. `cursor` is the last seen order ID
/// (IDs sort by creation time); `search` matches the order number as
/// free text and the external reference / player identifier exactly.
pub async fn admin_page(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    limit: i64,
    cursor: Option<i64>,
    search: Option<&str>,
) -> RepoResult<Vec<Order>> {
    let cursor = cursor.unwrap_or(i64::MAX);
    let rows = match search {
        Some(q) => {
            let pattern = format!("%{q}%");
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE tenant_id = ?1 AND id < ?2 \
                 AND (order_no LIKE ?3 OR external_ref = ?4 OR player_id = ?4) \
                 ORDER BY id DESC LIMIT ?5",
            )
            .bind(tenant_id)
            .bind(cursor)
            .bind(&pattern)
            .bind(q)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE tenant_id = ? AND id < ? \
                 ORDER BY id DESC LIMIT ?",
            )
            .bind(tenant_id)
            .bind(cursor)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// Orders the reconciliation sweep should look at: still pending, sent to
/// a provider, not yet terminal on the provider side. Oldest sync first.
pub async fn find_in_flight(pool: &sqlx::SqlitePool, limit: i64) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders \
         WHERE status = 'pending' AND external_status IN ('sent', 'processing') \
         AND provider_id IS NOT NULL AND external_ref IS NOT NULL \
         ORDER BY COALESCE(last_sync_at, 0) ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn set_status<'e, E>(exec: E, id: i64, status: OrderStatus) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = shared::util::now_millis();
    sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Record a successful external placement: provider, reference, mapped
/// status and the authoritative cost from the placed-order response.
#[allow(clippy::too_many_arguments)]
pub async fn apply_external_placement<'e, E>(
    exec: E,
    id: i64,
    provider_id: i64,
    external_ref: &str,
    external_status: ExternalStatus,
    message: Option<&str>,
    cost_amount: Option<f64>,
    cost_currency: Option<&str>,
) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET provider_id = ?, external_ref = ?, external_status = ?, \
         external_message = ?, sent_at = ?, last_sync_at = ?, \
         cost_amount = COALESCE(?, cost_amount), \
         cost_currency = COALESCE(?, cost_currency), \
         updated_at = ? WHERE id = ?",
    )
    .bind(provider_id)
    .bind(external_ref)
    .bind(external_status)
    .bind(message)
    .bind(now)
    .bind(now)
    .bind(cost_amount)
    .bind(cost_currency)
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Stamp a terminal external outcome (done/failed) with completion time
/// and duration since dispatch.
pub async fn complete_external<'e, E>(
    exec: E,
    id: i64,
    external_status: ExternalStatus,
    message: Option<&str>,
) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET external_status = ?1, \
         external_message = COALESCE(?2, external_message), \
         last_sync_at = ?3, completed_at = ?3, \
         duration_ms = ?3 - COALESCE(sent_at, created_at), updated_at = ?3 \
         WHERE id = ?4",
    )
    .bind(external_status)
    .bind(message)
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Non-terminal sync update from a provider check.
pub async fn record_check<'e, E>(
    exec: E,
    id: i64,
    external_status: ExternalStatus,
    message: Option<&str>,
) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET external_status = ?, \
         external_message = COALESCE(?, external_message), \
         last_sync_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(external_status)
    .bind(message)
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn incr_attempts<'e, E>(exec: E, id: i64) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE orders SET attempts = attempts + 1 WHERE id = ?")
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Approval snapshot written by the FX freeze.
#[derive(Debug, Clone)]
pub struct FxSnapshot {
    pub fx_rate: f64,
    pub sell_home: f64,
    pub cost_home: f64,
    pub profit_home: f64,
    pub approved_at: i64,
    pub approval_date: String,
    pub approval_month: String,
}

/// Write the approval snapshot. Guarded so re-invocation (or a race with
/// a revert) is a no-op: only an approved, not-yet-frozen order takes it.
pub async fn write_fx_snapshot<'e, E>(exec: E, id: i64, snap: &FxSnapshot) -> RepoResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET fx_locked = 1, fx_rate = ?, sell_home = ?, cost_home = ?, \
         profit_home = ?, approved_at = ?, approval_date = ?, approval_month = ?, \
         updated_at = ? WHERE id = ? AND status = 'approved' AND fx_locked = 0",
    )
    .bind(snap.fx_rate)
    .bind(snap.sell_home)
    .bind(snap.cost_home)
    .bind(snap.profit_home)
    .bind(snap.approved_at)
    .bind(&snap.approval_date)
    .bind(&snap.approval_month)
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn clear_fx_snapshot<'e, E>(exec: E, id: i64) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET fx_locked = 0, fx_rate = NULL, sell_home = NULL, cost_home = NULL, \
         profit_home = NULL, approved_at = NULL, approval_date = NULL, approval_month = NULL, \
         updated_at = ? WHERE id = ?",
    )
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Set the authoritative cost recorded for the order (code cost or
/// provider-quoted price).
pub async fn set_cost<'e, E>(exec: E, id: i64, amount: f64, currency: &str) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE orders SET cost_amount = ?, cost_currency = ? WHERE id = ?")
        .bind(amount)
        .bind(currency)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

// ========== Notes (append-only) ==========

pub async fn add_note<'e, E>(exec: E, order_id: i64, author: &str, text: &str) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO order_note (id, order_id, author, text, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(order_id)
    .bind(author)
    .bind(text)
    .bind(shared::util::now_millis())
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn notes_for(pool: &sqlx::SqlitePool, order_id: i64) -> RepoResult<Vec<OrderNote>> {
    let rows = sqlx::query_as::<_, OrderNote>(
        "SELECT * FROM order_note WHERE order_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
