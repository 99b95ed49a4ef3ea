//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 下单和订单查询 (用户侧)
//! - [`admin_orders`] - 订单管理 (审批/驳回、游标分页、调度日志)
//! - [`routing`] - 包装的履约路由配置
//! - [`code_groups`] - 卡密批次和导入
//! - [`providers`] - 供应商余额/目录/成本刷新
//! - [`accounting`] - 账期查询和关账

pub mod accounting;
pub mod admin_orders;
pub mod code_groups;
pub mod health;
pub mod orders;
pub mod providers;
pub mod routing;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    // Everything except health requires the gateway identity headers
    let protected = Router::new()
        .merge(orders::router())
        .merge(admin_orders::router())
        .merge(routing::router())
        .merge(code_groups::router())
        .merge(providers::router())
        .merge(accounting::router())
        .route_layer(axum::middleware::from_fn(crate::auth::require_context));

    Router::new().merge(health::router()).merge(protected)
}

/// Build a fully configured application with all middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state)
}
