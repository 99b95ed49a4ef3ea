//! Accounting Period API (查询 + 关账)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/admin/accounting-periods", get(handler::list))
        .route("/api/admin/accounting-periods/close", post(handler::close))
}
