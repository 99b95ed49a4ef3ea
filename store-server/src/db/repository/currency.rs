//! Currency Repository
//!
//! Read-only: the rate table is maintained by the upstream admin surface.

use super::RepoResult;
use sqlx::Sqlite;

/// Current rate (units per 1 USD) for a currency code, if configured.
pub async fn find_rate<'e, E>(exec: E, tenant_id: i64, code: &str) -> RepoResult<Option<f64>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rate = sqlx::query_scalar::<_, f64>(
        "SELECT rate_per_usd FROM currency WHERE tenant_id = ? AND code = ?",
    )
    .bind(tenant_id)
    .bind(code)
    .fetch_optional(exec)
    .await?;
    Ok(rate)
}
