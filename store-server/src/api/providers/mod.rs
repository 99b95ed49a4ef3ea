//! Provider Admin API
//!
//! Balance passthrough, explicit catalog refresh (cache invalidation),
//! and on-demand provider cost refresh for a package mapping.

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/admin/providers/{id}/balance",
            get(handler::balance),
        )
        .route(
            "/api/admin/providers/{id}/catalog/refresh",
            post(handler::refresh_catalog),
        )
        .route(
            "/api/admin/packages/{package_id}/providers/{provider_id}/cost/refresh",
            post(handler::refresh_cost),
        )
}
