//! Request context extraction
//!
//! Tenant and user resolution is owned by the upstream gateway, which
//! terminates authentication and forwards trusted identity headers. This
//! module only lifts those headers into a typed [`RequestContext`]:
//!
//! - `x-tenant-id` (required) — the tenant every query is scoped by
//! - `x-user-id` (optional) — the acting end user, required by checkout
//! - `x-actor` (optional) — display name recorded on notes/audit fields

use axum::{extract::Request, middleware::Next, response::Response};

use crate::utils::AppError;

/// Identity attached to every request by [`require_context`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant_id: i64,
    pub user_id: Option<i64>,
    pub actor: String,
}

impl RequestContext {
    /// The acting end user, or a validation error for user-facing
    /// endpoints reached without one.
    pub fn require_user(&self) -> Result<i64, AppError> {
        self.user_id
            .ok_or_else(|| AppError::Validation("Missing x-user-id header".into()))
    }
}

fn header_i64(req: &Request, name: &str) -> Result<Option<i64>, AppError> {
    match req.headers().get(name) {
        None => Ok(None),
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::Validation(format!("Invalid {name} header")))?;
            value
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Invalid {name} header")))
        }
    }
}

/// Middleware: build the [`RequestContext`] or reject the request.
pub async fn require_context(mut req: Request, next: Next) -> Result<Response, AppError> {
    let tenant_id = header_i64(&req, "x-tenant-id")?
        .ok_or_else(|| AppError::Validation("Missing x-tenant-id header".into()))?;
    let user_id = header_i64(&req, "x-user-id")?;
    let actor = req
        .headers()
        .get("x-actor")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("system")
        .to_string();

    req.extensions_mut().insert(RequestContext {
        tenant_id,
        user_id,
        actor,
    });
    Ok(next.run(req).await)
}
