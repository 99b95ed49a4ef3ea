//! User Repository
//!
//! Wallet mutations are single guarded UPDATE expressions so concurrent
//! requests can never lose an increment. Amounts are rounded to 2dp in
//! SQL to keep the REAL column from accumulating float drift.

use super::RepoResult;
use shared::models::User;
use sqlx::{Sqlite, SqliteConnection};

pub async fn find_by_id<'e, E>(exec: E, tenant_id: i64, id: i64) -> RepoResult<Option<User>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, User>("SELECT * FROM user WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(exec)
        .await?;
    Ok(row)
}

/// Debit the wallet, guarded by the overdraft ceiling.
///
/// Returns `false` (no mutation) when `balance + overdraft_limit` cannot
/// cover the amount or the user is inactive.
pub async fn debit(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    user_id: i64,
    amount: f64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE user SET balance = ROUND(balance - ?1, 2), updated_at = ?2 \
         WHERE id = ?3 AND tenant_id = ?4 AND is_active = 1 \
         AND balance + overdraft_limit >= ?1 - 1e-9",
    )
    .bind(amount)
    .bind(now)
    .bind(user_id)
    .bind(tenant_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Credit the wallet (refund path). Unconditional.
pub async fn credit(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    user_id: i64,
    amount: f64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE user SET balance = ROUND(balance + ?1, 2), updated_at = ?2 \
         WHERE id = ?3 AND tenant_id = ?4",
    )
    .bind(amount)
    .bind(now)
    .bind(user_id)
    .bind(tenant_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}
