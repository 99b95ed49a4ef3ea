//! In-process mock adapter
//!
//! Scriptable adapter used by the test suites and dry runs: queue the
//! responses you want, then assert on the recorded calls. Mirrors the
//! in-memory transport idea — same contract, no network.

use super::{
    AdapterError, AdapterFactory, AdapterResult, OrderCheck, PlaceOrder, PlacedOrder,
    ProviderAdapter, ProviderBalance, ProviderProduct,
};
use async_trait::async_trait;
use shared::models::Provider;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockAdapter {
    place_queue: Mutex<VecDeque<AdapterResult<PlacedOrder>>>,
    check_map: Mutex<HashMap<String, AdapterResult<OrderCheck>>>,
    products: Mutex<Vec<ProviderProduct>>,
    pub place_calls: AtomicUsize,
    pub check_calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the result of the next `place_order` call.
    pub fn push_place(&self, result: AdapterResult<PlacedOrder>) {
        self.place_queue
            .lock()
            .expect("mock lock poisoned")
            .push_back(result);
    }

    /// Set the result returned for an external ref on `check_orders`.
    pub fn set_check(&self, external_ref: &str, result: AdapterResult<OrderCheck>) {
        self.check_map
            .lock()
            .expect("mock lock poisoned")
            .insert(external_ref.to_string(), result);
    }

    pub fn set_products(&self, products: Vec<ProviderProduct>) {
        *self.products.lock().expect("mock lock poisoned") = products;
    }

    pub fn place_call_count(&self) -> usize {
        self.place_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    async fn get_balance(&self) -> AdapterResult<ProviderBalance> {
        Ok(ProviderBalance {
            amount: 1_000.0,
            currency: "USD".into(),
        })
    }

    async fn list_products(&self) -> AdapterResult<Vec<ProviderProduct>> {
        Ok(self.products.lock().expect("mock lock poisoned").clone())
    }

    async fn place_order(&self, _req: &PlaceOrder) -> AdapterResult<PlacedOrder> {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        self.place_queue
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(AdapterError::Transport(
                    "mock: no scripted place_order result".into(),
                ))
            })
    }

    async fn check_orders(&self, refs: &[String]) -> AdapterResult<Vec<OrderCheck>> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let map = self.check_map.lock().expect("mock lock poisoned");
        let mut out = Vec::new();
        for r in refs {
            match map.get(r) {
                Some(Ok(check)) => out.push(check.clone()),
                Some(Err(e)) => return Err(e.clone()),
                None => {}
            }
        }
        Ok(out)
    }
}

/// Adapter factory routing each provider row to a scripted mock.
#[derive(Default)]
pub struct MockFactory {
    adapters: Mutex<HashMap<i64, Arc<MockAdapter>>>,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register (or fetch) the mock for a provider ID.
    pub fn mock_for(&self, provider_id: i64) -> Arc<MockAdapter> {
        self.adapters
            .lock()
            .expect("mock lock poisoned")
            .entry(provider_id)
            .or_insert_with(MockAdapter::new)
            .clone()
    }
}

impl AdapterFactory for MockFactory {
    fn adapter_for(&self, provider: &Provider) -> AdapterResult<Arc<dyn ProviderAdapter>> {
        Ok(self.mock_for(provider.id))
    }
}
