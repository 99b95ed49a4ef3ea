//! Code Inventory Repository
//!
//! The claim is one UPDATE…RETURNING statement over the oldest available
//! row, so two concurrent dispatches can never consume the same code —
//! SQLite serializes the write and the loser's inner SELECT no longer
//! sees the row.

use super::RepoResult;
use shared::models::{CodeGroup, CodeItem};
use sqlx::{Sqlite, SqliteConnection};

/// Claim the oldest `available` code in a group for an order, marking it
/// `used` and attaching the order in the same statement. Returns `None`
/// when the group is empty.
pub async fn claim_oldest_available(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    group_id: i64,
    order_id: i64,
) -> RepoResult<Option<CodeItem>> {
    let now = shared::util::now_millis();
    let row = sqlx::query_as::<_, CodeItem>(
        "UPDATE code_item SET status = 'used', order_id = ?1, used_at = ?2 \
         WHERE id = (\
             SELECT id FROM code_item \
             WHERE tenant_id = ?3 AND group_id = ?4 AND status = 'available' \
             ORDER BY created_at ASC, id ASC LIMIT 1\
         ) AND status = 'available' \
         RETURNING *",
    )
    .bind(order_id)
    .bind(now)
    .bind(tenant_id)
    .bind(group_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn create_group(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    name: &str,
) -> RepoResult<CodeGroup> {
    let group = CodeGroup {
        id: shared::util::snowflake_id(),
        tenant_id,
        name: name.to_string(),
        created_at: shared::util::now_millis(),
    };
    sqlx::query("INSERT INTO code_group (id, tenant_id, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(group.id)
        .bind(group.tenant_id)
        .bind(&group.name)
        .bind(group.created_at)
        .execute(pool)
        .await?;
    Ok(group)
}

pub async fn find_group<'e, E>(exec: E, tenant_id: i64, id: i64) -> RepoResult<Option<CodeGroup>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, CodeGroup>(
        "SELECT * FROM code_group WHERE id = ? AND tenant_id = ?",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

pub async fn list_groups(pool: &sqlx::SqlitePool, tenant_id: i64) -> RepoResult<Vec<CodeGroup>> {
    let rows = sqlx::query_as::<_, CodeGroup>(
        "SELECT * FROM code_group WHERE tenant_id = ? ORDER BY created_at DESC",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Bulk import codes into a group. Returns the number inserted.
pub async fn import_items(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    group_id: i64,
    items: &[shared::models::code::CodeImportItem],
) -> RepoResult<usize> {
    let mut tx = pool.begin().await.map_err(super::RepoError::from)?;
    for item in items {
        sqlx::query(
            "INSERT INTO code_item (id, tenant_id, group_id, pin, serial, cost_usd, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, 'available', ?)",
        )
        .bind(shared::util::snowflake_id())
        .bind(tenant_id)
        .bind(group_id)
        .bind(&item.pin)
        .bind(&item.serial)
        .bind(item.cost_usd)
        .bind(shared::util::now_millis())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await.map_err(super::RepoError::from)?;
    Ok(items.len())
}

pub async fn list_items(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    group_id: i64,
) -> RepoResult<Vec<CodeItem>> {
    let rows = sqlx::query_as::<_, CodeItem>(
        "SELECT * FROM code_item WHERE tenant_id = ? AND group_id = ? \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(tenant_id)
    .bind(group_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_available<'e, E>(exec: E, tenant_id: i64, group_id: i64) -> RepoResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM code_item \
         WHERE tenant_id = ? AND group_id = ? AND status = 'available'",
    )
    .bind(tenant_id)
    .bind(group_id)
    .fetch_one(exec)
    .await?;
    Ok(count)
}
