//! Order API Module (user-facing)
//!
//! Checkout and order queries. Status mutations live under the admin
//! router; dispatch and reconciliation never go through HTTP.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/notes", post(handler::add_note))
}
