//! Order API Handlers (user-facing)

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use validator::Validate;

use crate::auth::RequestContext;
use crate::core::ServerState;
use crate::db::repository::order as order_repo;
use crate::utils::{AppError, AppResult};
use shared::models::{Order, OrderCreate, OrderNoteCreate, OrderStatus, OrderView};

const DEFAULT_LIMIT: i64 = 50;

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
}

/// POST /api/orders - 下单 (checkout)
///
/// The wallet debit and the order insert commit together; dispatch runs
/// afterwards as a detached task so its failure can never unwind an
/// accepted order.
pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<OrderView>> {
    payload.validate()?;
    let user_id = ctx.require_user()?;

    let view = state
        .orders
        .create_order(ctx.tenant_id, user_id, payload)
        .await?;

    let dispatcher = state.dispatcher.clone();
    let tenant_id = ctx.tenant_id;
    let order_id = view.order.id;
    tokio::spawn(async move {
        if let Err(e) = dispatcher.dispatch(tenant_id, order_id).await {
            tracing::error!(order_id, error = %e, "Dispatch after checkout failed");
        }
    });

    Ok(Json(view))
}

/// GET /api/orders?status= - 当前用户的订单
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let user_id = ctx.require_user()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);
    let orders =
        order_repo::list_for_user(&state.pool, ctx.tenant_id, user_id, query.status, limit)
            .await
            .map_err(crate::orders::OrderError::from)?;
    Ok(Json(orders))
}

/// GET /api/orders/{id} - 订单详情 (含备注)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderView>> {
    let view = state.orders.view(ctx.tenant_id, id).await?;
    // A user can only see their own orders
    if let Some(user_id) = ctx.user_id
        && view.order.user_id != user_id
    {
        return Err(AppError::not_found(format!("Order {id}")));
    }
    Ok(Json(view))
}

/// POST /api/orders/{id}/notes - 追加备注
pub async fn add_note(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderNoteCreate>,
) -> AppResult<Json<OrderView>> {
    payload.validate()?;
    let view = state
        .orders
        .add_note(ctx.tenant_id, id, &ctx.actor, &payload.text)
        .await?;
    Ok(Json(view))
}
