//! Provider Registry
//!
//! Builds concrete adapters from provider configuration rows and holds
//! the product-metadata cache, keyed by (tenant_id, provider_id) with
//! explicit invalidation on catalog refresh — no implicit
//! process-lifetime state.

use super::{
    AdapterError, AdapterResult, OrbitPay, ProviderAdapter, ProviderProduct, VoltPin,
};
use crate::core::Config;
use dashmap::DashMap;
use shared::models::{Provider, ProviderKind};
use std::sync::Arc;
use std::time::Duration;

pub struct ProviderRegistry {
    http: reqwest::Client,
    meta_cache: DashMap<(i64, i64), Arc<Vec<ProviderProduct>>>,
}

impl ProviderRegistry {
    pub fn new(config: &Config) -> Self {
        // Bounded provider calls: every adapter shares one client with an
        // explicit request timeout
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.provider_timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            http,
            meta_cache: DashMap::new(),
        }
    }

    /// Cached catalog for a provider, if a refresh has happened.
    pub fn cached_products(
        &self,
        tenant_id: i64,
        provider_id: i64,
    ) -> Option<Arc<Vec<ProviderProduct>>> {
        self.meta_cache
            .get(&(tenant_id, provider_id))
            .map(|e| e.value().clone())
    }

    /// Drop the cached catalog for a provider.
    pub fn invalidate(&self, tenant_id: i64, provider_id: i64) {
        self.meta_cache.remove(&(tenant_id, provider_id));
    }

    /// Re-fetch the provider catalog and replace the cache entry.
    pub async fn refresh_catalog(
        &self,
        provider: &Provider,
    ) -> AdapterResult<Arc<Vec<ProviderProduct>>> {
        let adapter = crate::providers::AdapterFactory::adapter_for(self, provider)?;
        let products = Arc::new(adapter.list_products().await?);
        self.meta_cache
            .insert((provider.tenant_id, provider.id), products.clone());
        tracing::info!(
            provider_id = provider.id,
            tenant_id = provider.tenant_id,
            count = products.len(),
            "Provider catalog refreshed"
        );
        Ok(products)
    }
}

impl super::AdapterFactory for ProviderRegistry {
    fn adapter_for(&self, provider: &Provider) -> AdapterResult<Arc<dyn ProviderAdapter>> {
        match provider.kind {
            ProviderKind::Voltpin => {
                let secret = provider.api_secret.clone().ok_or_else(|| {
                    AdapterError::Config(format!("provider {} has no api_secret", provider.id))
                })?;
                Ok(Arc::new(VoltPin::new(
                    self.http.clone(),
                    provider.base_url.clone(),
                    provider.api_key.clone(),
                    secret,
                )))
            }
            ProviderKind::Orbitpay => Ok(Arc::new(OrbitPay::new(
                self.http.clone(),
                provider.base_url.clone(),
                provider.api_key.clone(),
            ))),
            ProviderKind::Mock => Err(AdapterError::Config(
                "mock providers are only available through an injected factory".into(),
            )),
        }
    }
}
