//! Tenant Repository (read-only — provisioning lives upstream)

use super::RepoResult;
use shared::models::Tenant;
use sqlx::Sqlite;

pub async fn find_by_id<'e, E>(exec: E, id: i64) -> RepoResult<Option<Tenant>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, Tenant>("SELECT * FROM tenant WHERE id = ?")
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(row)
}
