//! Routing Configuration Repository

use super::RepoResult;
use shared::models::RoutingConfig;
use sqlx::Sqlite;

pub async fn find_for_package<'e, E>(
    exec: E,
    tenant_id: i64,
    package_id: i64,
) -> RepoResult<Option<RoutingConfig>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, RoutingConfig>(
        "SELECT * FROM routing_config WHERE package_id = ? AND tenant_id = ?",
    )
    .bind(package_id)
    .bind(tenant_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

/// Write a (pre-normalized) routing row. Upsert keyed by package.
pub async fn upsert(pool: &sqlx::SqlitePool, config: &RoutingConfig) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO routing_config \
         (package_id, tenant_id, mode, fulfillment, primary_provider_id, \
          fallback_provider_id, code_group_id, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         ON CONFLICT (package_id) DO UPDATE SET \
            mode = ?3, fulfillment = ?4, primary_provider_id = ?5, \
            fallback_provider_id = ?6, code_group_id = ?7, updated_at = ?8",
    )
    .bind(config.package_id)
    .bind(config.tenant_id)
    .bind(config.mode)
    .bind(config.fulfillment)
    .bind(config.primary_provider_id)
    .bind(config.fallback_provider_id)
    .bind(config.code_group_id)
    .bind(config.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}
