//! Admin Order API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};

use crate::auth::RequestContext;
use crate::core::ServerState;
use crate::db::repository::{dispatch_log, order as order_repo};
use crate::orders::OrderError;
use crate::utils::AppResult;
use shared::models::{DispatchLog, Order, OrderStatus, OrderView};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
}

/// GET /api/admin/orders?status= - 订单列表
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let orders = order_repo::admin_list(&state.pool, ctx.tenant_id, query.status, limit)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(orders))
}

#[derive(serde::Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    /// Last order ID of the previous page
    pub cursor: Option<i64>,
    /// Free text over order number; exact match on external ref / player ID
    pub q: Option<String>,
}

#[derive(serde::Serialize)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub next_cursor: Option<i64>,
}

/// GET /api/admin/orders/page - 游标分页 + 搜索
pub async fn page(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<OrderPage>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let items = order_repo::admin_page(&state.pool, ctx.tenant_id, limit, query.cursor, search)
        .await
        .map_err(OrderError::from)?;
    let next_cursor = if items.len() as i64 == limit {
        items.last().map(|o| o.id)
    } else {
        None
    };
    Ok(Json(OrderPage { items, next_cursor }))
}

/// GET /api/admin/orders/{id} - 订单详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderView>> {
    Ok(Json(state.orders.view(ctx.tenant_id, id).await?))
}

#[derive(serde::Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// PATCH /api/admin/orders/{id}/status - 手动审批/驳回
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<OrderView>> {
    let view = state
        .orders
        .update_status(ctx.tenant_id, id, payload.status, &ctx.actor)
        .await?;
    Ok(Json(view))
}

/// GET /api/admin/orders/{id}/dispatch-logs - 调度日志
pub async fn dispatch_logs(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<DispatchLog>>> {
    let logs = dispatch_log::list_for_order(&state.pool, ctx.tenant_id, id)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(logs))
}
