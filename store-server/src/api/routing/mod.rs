//! Routing Configuration API
//!
//! Per-package fulfillment routing. Writes are normalized (see
//! `orders::routing::normalize`), so the stored row always satisfies the
//! mutual-exclusion invariants.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/admin/packages/{package_id}/routing",
        get(handler::get_routing).put(handler::put_routing),
    )
}
