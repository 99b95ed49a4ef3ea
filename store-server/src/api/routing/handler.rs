//! Routing Configuration Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::RequestContext;
use crate::core::ServerState;
use crate::db::repository::{catalog, routing as routing_repo};
use crate::orders::OrderError;
use crate::orders::routing as routing_core;
use crate::utils::{AppError, AppResult};
use shared::models::{RoutingConfig, RoutingUpdate};

/// GET /api/admin/packages/{id}/routing - 当前路由配置
pub async fn get_routing(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(package_id): Path<i64>,
) -> AppResult<Json<Option<RoutingConfig>>> {
    let config = routing_repo::find_for_package(&state.pool, ctx.tenant_id, package_id)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(config))
}

/// PUT /api/admin/packages/{id}/routing - 更新路由 (自动归一化)
pub async fn put_routing(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(package_id): Path<i64>,
    Json(payload): Json<RoutingUpdate>,
) -> AppResult<Json<RoutingConfig>> {
    // The package must exist within the tenant
    catalog::find_package(&state.pool, ctx.tenant_id, package_id)
        .await
        .map_err(OrderError::from)?
        .ok_or_else(|| AppError::not_found(format!("Package {package_id}")))?;

    let config = routing_core::update(&state.pool, ctx.tenant_id, package_id, payload)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(config))
}
