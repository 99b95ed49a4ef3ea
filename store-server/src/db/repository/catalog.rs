//! Catalog Repository — products, packages, price-group overrides

use super::RepoResult;
use shared::models::{Package, Product};
use sqlx::Sqlite;

pub async fn find_package<'e, E>(exec: E, tenant_id: i64, id: i64) -> RepoResult<Option<Package>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, Package>(
        "SELECT * FROM package WHERE id = ? AND tenant_id = ? AND is_active = 1",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

pub async fn find_product<'e, E>(exec: E, tenant_id: i64, id: i64) -> RepoResult<Option<Product>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, Product>(
        "SELECT * FROM product WHERE id = ? AND tenant_id = ? AND is_active = 1",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

/// USD price override for a (package, price group), if any.
pub async fn find_price_override<'e, E>(
    exec: E,
    package_id: i64,
    price_group_id: i64,
) -> RepoResult<Option<f64>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let price = sqlx::query_scalar::<_, f64>(
        "SELECT price_usd FROM package_price_override \
         WHERE package_id = ? AND price_group_id = ?",
    )
    .bind(package_id)
    .bind(price_group_id)
    .fetch_optional(exec)
    .await?;
    Ok(price)
}
