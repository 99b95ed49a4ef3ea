//! Code Inventory Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use validator::Validate;

use crate::auth::RequestContext;
use crate::core::ServerState;
use crate::db::repository::code;
use crate::orders::OrderError;
use crate::utils::{AppError, AppResult};
use shared::models::{CodeGroup, CodeGroupCreate, CodeImport, CodeItem};

/// POST /api/admin/code-groups - 创建批次
pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CodeGroupCreate>,
) -> AppResult<Json<CodeGroup>> {
    payload.validate()?;
    let group = code::create_group(&state.pool, ctx.tenant_id, &payload.name)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(group))
}

/// GET /api/admin/code-groups - 批次列表
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<Vec<CodeGroup>>> {
    let groups = code::list_groups(&state.pool, ctx.tenant_id)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(groups))
}

#[derive(serde::Serialize)]
pub struct ImportResult {
    pub imported: usize,
    pub available: i64,
}

/// POST /api/admin/code-groups/{id}/codes - 批量导入卡密
pub async fn import(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(group_id): Path<i64>,
    Json(payload): Json<CodeImport>,
) -> AppResult<Json<ImportResult>> {
    payload.validate()?;
    code::find_group(&state.pool, ctx.tenant_id, group_id)
        .await
        .map_err(OrderError::from)?
        .ok_or_else(|| AppError::not_found(format!("Code group {group_id}")))?;

    let imported = code::import_items(&state.pool, ctx.tenant_id, group_id, &payload.codes)
        .await
        .map_err(OrderError::from)?;
    let available = code::count_available(&state.pool, ctx.tenant_id, group_id)
        .await
        .map_err(OrderError::from)?;
    tracing::info!(group_id, imported, available, "Codes imported");
    Ok(Json(ImportResult {
        imported,
        available,
    }))
}

/// GET /api/admin/code-groups/{id}/codes - 批次内卡密
pub async fn list_codes(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(group_id): Path<i64>,
) -> AppResult<Json<Vec<CodeItem>>> {
    let items = code::list_items(&state.pool, ctx.tenant_id, group_id)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(items))
}
