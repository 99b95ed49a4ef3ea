//! Dispatch Log Repository (append-only)

use super::RepoResult;
use shared::models::{DispatchAction, DispatchLog, DispatchResult};
use sqlx::Sqlite;

#[allow(clippy::too_many_arguments)]
pub async fn append<'e, E>(
    exec: E,
    tenant_id: i64,
    order_id: i64,
    provider_id: Option<i64>,
    action: DispatchAction,
    result: DispatchResult,
    message: &str,
    snapshot: Option<&serde_json::Value>,
) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO dispatch_log \
         (id, tenant_id, order_id, provider_id, action, result, message, snapshot, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(tenant_id)
    .bind(order_id)
    .bind(provider_id)
    .bind(action)
    .bind(result)
    .bind(message)
    .bind(snapshot.map(|s| s.to_string()))
    .bind(shared::util::now_millis())
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn list_for_order(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    order_id: i64,
) -> RepoResult<Vec<DispatchLog>> {
    let rows = sqlx::query_as::<_, DispatchLog>(
        "SELECT * FROM dispatch_log WHERE tenant_id = ? AND order_id = ? \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(tenant_id)
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
