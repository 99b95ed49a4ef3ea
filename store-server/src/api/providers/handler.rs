//! Provider Admin Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::RequestContext;
use crate::core::ServerState;
use crate::db::repository::provider as provider_repo;
use crate::orders::OrderError;
use crate::providers::{AdapterFactory, ProviderBalance};
use crate::utils::{AppError, AppResult};
use shared::models::{Provider, ProviderCost};

async fn load_provider(
    state: &ServerState,
    tenant_id: i64,
    provider_id: i64,
) -> Result<Provider, AppError> {
    provider_repo::find_by_id(&state.pool, tenant_id, provider_id)
        .await
        .map_err(OrderError::from)?
        .ok_or_else(|| AppError::not_found(format!("Provider {provider_id}")))
}

/// GET /api/admin/providers/{id}/balance - 供应商余额
pub async fn balance(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(provider_id): Path<i64>,
) -> AppResult<Json<ProviderBalance>> {
    let provider = load_provider(&state, ctx.tenant_id, provider_id).await?;
    let adapter = state
        .registry
        .adapter_for(&provider)
        .map_err(|e| AppError::internal(e.to_string()))?;
    let balance = adapter
        .get_balance()
        .await
        .map_err(|e| AppError::internal(format!("Provider call failed: {e}")))?;
    Ok(Json(balance))
}

#[derive(serde::Serialize)]
pub struct CatalogRefreshResult {
    pub products: usize,
}

/// POST /api/admin/providers/{id}/catalog/refresh - 刷新目录缓存
pub async fn refresh_catalog(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path(provider_id): Path<i64>,
) -> AppResult<Json<CatalogRefreshResult>> {
    let provider = load_provider(&state, ctx.tenant_id, provider_id).await?;
    // Invalidate first so a failed fetch never leaves a stale cache entry
    state.registry.invalidate(ctx.tenant_id, provider_id);
    let products = state
        .registry
        .refresh_catalog(&provider)
        .await
        .map_err(|e| AppError::internal(format!("Provider call failed: {e}")))?;
    Ok(Json(CatalogRefreshResult {
        products: products.len(),
    }))
}

/// POST /api/admin/packages/{package_id}/providers/{provider_id}/cost/refresh
///
/// Re-quote the cached cost for a (package, provider) mapping from the
/// provider catalog. Display/estimation aid only — authoritative order
/// costs always come from the actual placed-order response.
pub async fn refresh_cost(
    State(state): State<ServerState>,
    Extension(ctx): Extension<RequestContext>,
    Path((package_id, provider_id)): Path<(i64, i64)>,
) -> AppResult<Json<ProviderCost>> {
    let provider = load_provider(&state, ctx.tenant_id, provider_id).await?;
    let mapping = provider_repo::find_mapping(&state.pool, package_id, provider_id)
        .await
        .map_err(OrderError::from)?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "Mapping for package {package_id} on provider {provider_id}"
            ))
        })?;

    let products = match state.registry.cached_products(ctx.tenant_id, provider_id) {
        Some(products) => products,
        None => state
            .registry
            .refresh_catalog(&provider)
            .await
            .map_err(|e| AppError::internal(format!("Provider call failed: {e}")))?,
    };

    let product = products
        .iter()
        .find(|p| p.product_ref == mapping.product_ref)
        .ok_or_else(|| {
            AppError::BusinessRule(format!(
                "Product {} not present in provider catalog",
                mapping.product_ref
            ))
        })?;

    provider_repo::update_cost(
        &state.pool,
        package_id,
        provider_id,
        product.price,
        &product.currency,
    )
    .await
    .map_err(OrderError::from)?;

    let refreshed = provider_repo::find_mapping(&state.pool, package_id, provider_id)
        .await
        .map_err(OrderError::from)?
        .ok_or_else(|| AppError::internal("mapping vanished during refresh"))?;
    Ok(Json(refreshed))
}
