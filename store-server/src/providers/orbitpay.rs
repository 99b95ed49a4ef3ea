//! OrbitPay adapter
//!
//! Bearer-token JSON REST API. The `client_ref` field on order creation
//! is the idempotency key — OrbitPay returns the existing order for a
//! repeated reference instead of creating a new one.

use super::{
    AdapterError, AdapterResult, MappedStatus, OrderCheck, PlaceOrder, PlacedOrder,
    ProviderAdapter, ProviderBalance, ProviderProduct,
};
use async_trait::async_trait;
use serde::Deserialize;

pub struct OrbitPay {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl OrbitPay {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> AdapterResult<T> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AdapterError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        serde_json::from_str(&body).map_err(|e| {
            AdapterError::Malformed(format!(
                "invalid JSON ({e}): {}",
                body.chars().take(120).collect::<String>()
            ))
        })
    }
}

// ========== Wire types ==========

#[derive(Debug, Deserialize)]
struct WireOrder {
    order_id: String,
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    price: Option<WirePrice>,
    #[serde(default)]
    voucher_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePrice {
    amount: f64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct WireLookup {
    orders: Vec<WireOrder>,
}

#[derive(Debug, Deserialize)]
struct WireBalance {
    amount: f64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct WireProducts {
    products: Vec<WireProduct>,
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    id: String,
    name: String,
    price: f64,
    currency: String,
    #[serde(default)]
    available: bool,
    #[serde(default = "default_qty")]
    min_qty: i64,
    #[serde(default = "default_qty")]
    max_qty: i64,
    #[serde(default)]
    required_fields: Vec<String>,
}

fn default_qty() -> i64 {
    1
}

/// OrbitPay status strings → three-way status. The single conversion
/// point for this provider.
fn map_status(raw: &str) -> AdapterResult<MappedStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "created" | "accepted" | "pending" | "processing" => Ok(MappedStatus::Pending),
        "completed" | "success" => Ok(MappedStatus::Success),
        "failed" | "cancelled" | "rejected" => Ok(MappedStatus::Failed),
        other => Err(AdapterError::UnknownStatus(format!(
            "orbitpay status '{other}'"
        ))),
    }
}

fn normalize_order(wire: WireOrder) -> AdapterResult<PlacedOrder> {
    let mapped = map_status(&wire.status)?;
    Ok(PlacedOrder {
        external_ref: wire.order_id,
        raw_status: wire.status,
        mapped,
        message: wire.message,
        price: wire.price.as_ref().map(|p| p.amount),
        currency: wire.price.map(|p| p.currency),
    })
}

fn normalize_check(wire: WireOrder) -> AdapterResult<OrderCheck> {
    let mapped = map_status(&wire.status)?;
    Ok(OrderCheck {
        external_ref: wire.order_id,
        raw_status: wire.status,
        mapped,
        message: wire.message,
        redemption_code: wire.voucher_code,
    })
}

#[async_trait]
impl ProviderAdapter for OrbitPay {
    async fn get_balance(&self) -> AdapterResult<ProviderBalance> {
        let resp = self
            .http
            .get(self.url("/v1/balance"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let wire: WireBalance = Self::read_json(resp).await?;
        Ok(ProviderBalance {
            amount: wire.amount,
            currency: wire.currency,
        })
    }

    async fn list_products(&self) -> AdapterResult<Vec<ProviderProduct>> {
        let resp = self
            .http
            .get(self.url("/v1/products"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let wire: WireProducts = Self::read_json(resp).await?;
        Ok(wire
            .products
            .into_iter()
            .map(|p| ProviderProduct {
                product_ref: p.id,
                name: p.name,
                price: p.price,
                currency: p.currency,
                available: p.available,
                min_qty: p.min_qty,
                max_qty: p.max_qty,
                required_fields: p.required_fields,
            })
            .collect())
    }

    async fn place_order(&self, req: &PlaceOrder) -> AdapterResult<PlacedOrder> {
        let mut fields = serde_json::Map::new();
        if let Some(player) = &req.player_id {
            fields.insert("player_id".into(), player.as_str().into());
        }
        if let Some(extra) = &req.extra_field {
            fields.insert("extra".into(), extra.as_str().into());
        }
        let body = serde_json::json!({
            "product_id": req.product_ref,
            "quantity": req.quantity,
            "client_ref": req.idempotency_key,
            "fields": fields,
        });
        let resp = self
            .http
            .post(self.url("/v1/orders"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let wire: WireOrder = Self::read_json(resp).await?;
        normalize_order(wire)
    }

    async fn check_orders(&self, refs: &[String]) -> AdapterResult<Vec<OrderCheck>> {
        let resp = self
            .http
            .post(self.url("/v1/orders/lookup"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "refs": refs }))
            .send()
            .await?;
        let wire: WireLookup = Self::read_json(resp).await?;
        wire.orders.into_iter().map(normalize_check).collect()
    }
}
