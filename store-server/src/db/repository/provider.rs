//! Provider Repository — provider rows and package↔provider mappings

use super::RepoResult;
use shared::models::{Provider, ProviderCost};
use sqlx::Sqlite;

pub async fn find_by_id<'e, E>(exec: E, tenant_id: i64, id: i64) -> RepoResult<Option<Provider>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, Provider>(
        "SELECT * FROM provider WHERE id = ? AND tenant_id = ? AND is_active = 1",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

/// The provider-side product mapping for a package, if configured.
pub async fn find_mapping<'e, E>(
    exec: E,
    package_id: i64,
    provider_id: i64,
) -> RepoResult<Option<ProviderCost>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, ProviderCost>(
        "SELECT * FROM provider_cost WHERE package_id = ? AND provider_id = ?",
    )
    .bind(package_id)
    .bind(provider_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

/// Refresh the cached cost quote for a (package, provider) mapping.
pub async fn update_cost(
    pool: &sqlx::SqlitePool,
    package_id: i64,
    provider_id: i64,
    cost_amount: f64,
    cost_currency: &str,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE provider_cost SET cost_amount = ?, cost_currency = ?, refreshed_at = ? \
         WHERE package_id = ? AND provider_id = ?",
    )
    .bind(cost_amount)
    .bind(cost_currency)
    .bind(shared::util::now_millis())
    .bind(package_id)
    .bind(provider_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
