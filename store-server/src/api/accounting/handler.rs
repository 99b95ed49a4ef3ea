//! Accounting Period Handlers

use axum::{
    Json,
    extract::{Extension, State},
};

use crate::auth::RequestContext;
use crate::core::ServerState;
use crate::db::repository::accounting as accounting_repo;
use crate::orders::OrderError;
use crate::orders::accounting as accounting_core;
use crate::utils::AppResult;
use shared::models::AccountingPeriod;

/// GET /api/admin/accounting-periods - 账期列表
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<Vec<AccountingPeriod>>> {
    let periods = accounting_repo::list(&state.pool, ctx.tenant_id)
        .await
        .map_err(OrderError::from)?;
    Ok(Json(periods))
}

#[derive(serde::Deserialize)]
pub struct ClosePayload {
    pub year: i64,
    pub month: i64,
    pub note: Option<String>,
}

/// POST /api/admin/accounting-periods/close - 关账
///
/// Once closed, approved orders of that month can no longer leave
/// `approved`.
pub async fn close(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<ClosePayload>,
) -> AppResult<Json<AccountingPeriod>> {
    let period = accounting_core::close_month(
        &state.pool,
        ctx.tenant_id,
        payload.year,
        payload.month,
        &ctx.actor,
        payload.note.as_deref(),
    )
    .await
    .map_err(OrderError::from)?;
    Ok(Json(period))
}
