//! Shared test fixtures: in-memory database, seeded tenant/catalog, and
//! the order core wired to scriptable mock providers.
#![allow(dead_code)]

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use store_server::db::DbService;
use store_server::orders::{DispatchOrchestrator, OrderService};
use store_server::providers::MockFactory;
use store_server::services::NotificationService;

pub const TENANT: i64 = 1;
pub const USER: i64 = 100;
pub const PRODUCT: i64 = 200;
pub const PACKAGE: i64 = 300;
pub const PRIMARY_PROVIDER: i64 = 401;
pub const FALLBACK_PROVIDER: i64 = 402;

/// 40 USD package at rate 30 → 1200 in the user's currency
pub const PACKAGE_PRICE_USD: f64 = 40.0;
pub const RATE_THB: f64 = 30.0;
pub const TOTAL_THB: f64 = 1200.0;

pub struct TestEnv {
    pub pool: SqlitePool,
    pub orders: Arc<OrderService>,
    pub dispatcher: Arc<DispatchOrchestrator>,
    pub factory: Arc<MockFactory>,
}

pub async fn setup() -> TestEnv {
    setup_with_balance(100_000.0, 0.0).await
}

pub async fn setup_with_balance(balance: f64, overdraft: f64) -> TestEnv {
    let pool = DbService::new_in_memory().await.expect("in-memory db").pool;
    seed(&pool, balance, overdraft).await;

    let (notifications, _worker) = NotificationService::new(None, CancellationToken::new());
    let orders = Arc::new(OrderService::new(
        pool.clone(),
        chrono_tz::Asia::Bangkok,
        notifications,
    ));
    let factory = MockFactory::new();
    let dispatcher = Arc::new(DispatchOrchestrator::new(
        pool.clone(),
        factory.clone(),
        orders.clone(),
        10,
    ));

    TestEnv {
        pool,
        orders,
        dispatcher,
        factory,
    }
}

async fn seed(pool: &SqlitePool, balance: f64, overdraft: f64) {
    let now = shared::util::now_millis();

    sqlx::query("INSERT INTO tenant (id, name, home_currency, created_at) VALUES (?, 'Test Store', 'THB', ?)")
        .bind(TENANT)
        .bind(now)
        .execute(pool)
        .await
        .expect("seed tenant");

    sqlx::query(
        "INSERT INTO currency (tenant_id, code, rate_per_usd, updated_at) VALUES (?, 'THB', ?, ?)",
    )
    .bind(TENANT)
    .bind(RATE_THB)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed currency");

    sqlx::query(
        "INSERT INTO user (id, tenant_id, username, display_name, currency_code, balance, overdraft_limit, is_active, created_at, updated_at) \
         VALUES (?, ?, 'buyer', 'Buyer', 'THB', ?, ?, 1, ?, ?)",
    )
    .bind(USER)
    .bind(TENANT)
    .bind(balance)
    .bind(overdraft)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed user");

    sqlx::query(
        "INSERT INTO product (id, tenant_id, name, is_active, created_at, updated_at) \
         VALUES (?, ?, 'Mobile Legends', 1, ?, ?)",
    )
    .bind(PRODUCT)
    .bind(TENANT)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed product");

    sqlx::query(
        "INSERT INTO package (id, tenant_id, product_id, name, base_price_usd, base_cost_usd, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, '86 Diamonds', ?, 25.0, 1, ?, ?)",
    )
    .bind(PACKAGE)
    .bind(TENANT)
    .bind(PRODUCT)
    .bind(PACKAGE_PRICE_USD)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed package");

    for provider_id in [PRIMARY_PROVIDER, FALLBACK_PROVIDER] {
        sqlx::query(
            "INSERT INTO provider (id, tenant_id, name, kind, base_url, api_key, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, 'mock', 'http://mock.local', 'k', 1, ?, ?)",
        )
        .bind(provider_id)
        .bind(TENANT)
        .bind(format!("mock-{provider_id}"))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .expect("seed provider");

        sqlx::query(
            "INSERT INTO provider_cost (package_id, provider_id, tenant_id, product_ref) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(PACKAGE)
        .bind(provider_id)
        .bind(TENANT)
        .bind(format!("MOCK-{provider_id}"))
        .execute(pool)
        .await
        .expect("seed mapping");
    }
}

/// Point the package at external routing (primary + fallback).
pub async fn route_external(pool: &SqlitePool, primary: Option<i64>, fallback: Option<i64>) {
    store_server::orders::routing::update(
        pool,
        TENANT,
        PACKAGE,
        shared::models::RoutingUpdate {
            fulfillment: shared::models::FulfillmentType::External,
            primary_provider_id: primary,
            fallback_provider_id: fallback,
            code_group_id: None,
        },
    )
    .await
    .expect("route external");
}

/// Point the package at a code group.
pub async fn route_codes(pool: &SqlitePool, code_group_id: i64) {
    store_server::orders::routing::update(
        pool,
        TENANT,
        PACKAGE,
        shared::models::RoutingUpdate {
            fulfillment: shared::models::FulfillmentType::InternalCodes,
            primary_provider_id: None,
            fallback_provider_id: None,
            code_group_id: Some(code_group_id),
        },
    )
    .await
    .expect("route codes");
}

pub async fn user_balance(pool: &SqlitePool) -> f64 {
    sqlx::query_scalar::<_, f64>("SELECT balance FROM user WHERE id = ?")
        .bind(USER)
        .fetch_one(pool)
        .await
        .expect("balance")
}

pub async fn order_row(pool: &SqlitePool, id: i64) -> shared::models::Order {
    store_server::db::repository::order::find_by_id(pool, TENANT, id)
        .await
        .expect("find order")
        .expect("order exists")
}

pub fn checkout(quantity: i64) -> shared::models::OrderCreate {
    shared::models::OrderCreate {
        package_id: PACKAGE,
        quantity,
        player_id: Some("PLAYER-77".into()),
        extra_field: None,
    }
}

/// A scripted successful placement.
pub fn placed(external_ref: &str, mapped: store_server::providers::MappedStatus) -> store_server::providers::PlacedOrder {
    store_server::providers::PlacedOrder {
        external_ref: external_ref.to_string(),
        raw_status: format!("{mapped:?}").to_uppercase(),
        mapped,
        message: Some("scripted".into()),
        price: Some(27.5),
        currency: Some("USD".into()),
    }
}

pub fn check(
    external_ref: &str,
    mapped: store_server::providers::MappedStatus,
    redemption_code: Option<&str>,
) -> store_server::providers::OrderCheck {
    store_server::providers::OrderCheck {
        external_ref: external_ref.to_string(),
        raw_status: format!("{mapped:?}").to_uppercase(),
        mapped,
        message: None,
        redemption_code: redemption_code.map(str::to_string),
    }
}
