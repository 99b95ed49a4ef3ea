//! Accounting Period Repository

use super::RepoResult;
use shared::models::{AccountingPeriod, PeriodStatus};
use sqlx::Sqlite;

pub async fn find<'e, E>(
    exec: E,
    tenant_id: i64,
    year: i64,
    month: i64,
) -> RepoResult<Option<AccountingPeriod>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, AccountingPeriod>(
        "SELECT * FROM accounting_period WHERE tenant_id = ? AND year = ? AND month = ?",
    )
    .bind(tenant_id)
    .bind(year)
    .bind(month)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

pub async fn is_closed<'e, E>(exec: E, tenant_id: i64, year: i64, month: i64) -> RepoResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    Ok(find(exec, tenant_id, year, month)
        .await?
        .map(|p| p.status == PeriodStatus::Closed)
        .unwrap_or(false))
}

/// Close a month. Idempotent — closing an already-closed month keeps the
/// original closed_at/by.
pub async fn close(
    pool: &sqlx::SqlitePool,
    tenant_id: i64,
    year: i64,
    month: i64,
    closed_by: &str,
    note: Option<&str>,
) -> RepoResult<AccountingPeriod> {
    sqlx::query(
        "INSERT INTO accounting_period (tenant_id, year, month, status, closed_at, closed_by, note) \
         VALUES (?1, ?2, ?3, 'closed', ?4, ?5, ?6) \
         ON CONFLICT (tenant_id, year, month) DO UPDATE SET \
            status = 'closed', \
            closed_at = COALESCE(accounting_period.closed_at, ?4), \
            closed_by = COALESCE(accounting_period.closed_by, ?5), \
            note = COALESCE(?6, accounting_period.note)",
    )
    .bind(tenant_id)
    .bind(year)
    .bind(month)
    .bind(shared::util::now_millis())
    .bind(closed_by)
    .bind(note)
    .execute(pool)
    .await?;

    find(pool, tenant_id, year, month)
        .await?
        .ok_or_else(|| super::RepoError::Database("period upsert did not persist".into()))
}

pub async fn list(pool: &sqlx::SqlitePool, tenant_id: i64) -> RepoResult<Vec<AccountingPeriod>> {
    let rows = sqlx::query_as::<_, AccountingPeriod>(
        "SELECT * FROM accounting_period WHERE tenant_id = ? ORDER BY year DESC, month DESC",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
