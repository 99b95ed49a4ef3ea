//! Reconciliation poller scenarios: terminal outcomes, poller-invoked
//! fallback, forward-only status tracking, batch isolation.

mod common;

use std::time::Duration;

use common::*;
use shared::models::{ExternalStatus, OrderStatus};
use store_server::orders::ReconciliationPoller;
use store_server::providers::{AdapterError, MappedStatus};
use tokio_util::sync::CancellationToken;

fn poller(env: &TestEnv) -> ReconciliationPoller {
    ReconciliationPoller::new(
        env.pool.clone(),
        env.factory.clone(),
        env.orders.clone(),
        env.dispatcher.clone(),
        Duration::from_secs(5),
        10,
        CancellationToken::new(),
    )
}

/// Checkout + dispatch against the primary mock, which answers `Pending`
/// with the given external ref. Returns the order ID.
async fn in_flight_order(env: &TestEnv, external_ref: &str) -> i64 {
    let mock = env.factory.mock_for(PRIMARY_PROVIDER);
    mock.push_place(Ok(placed(external_ref, MappedStatus::Pending)));
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();
    order_id
}

#[tokio::test]
async fn test_done_check_approves_and_records_redemption_code() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), None).await;
    let order_id = in_flight_order(&env, "EXT-OK").await;

    let mock = env.factory.mock_for(PRIMARY_PROVIDER);
    mock.set_check(
        "EXT-OK",
        Ok(check("EXT-OK", MappedStatus::Success, Some("VOUCHER-123"))),
    );

    poller(&env).sweep().await;

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Approved);
    assert_eq!(order.external_status, Some(ExternalStatus::Done));
    assert!(order.completed_at.is_some());
    assert!(order.fx_locked);

    let view = env.orders.view(TENANT, order_id).await.unwrap();
    assert!(view.notes.iter().any(|n| n.text.contains("VOUCHER-123")));
}

#[tokio::test]
async fn test_processing_check_advances_forward_only() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), None).await;
    let order_id = in_flight_order(&env, "EXT-WAIT").await;

    let mock = env.factory.mock_for(PRIMARY_PROVIDER);
    mock.set_check("EXT-WAIT", Ok(check("EXT-WAIT", MappedStatus::Pending, None)));

    poller(&env).sweep().await;
    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.external_status, Some(ExternalStatus::Processing));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.last_sync_at.is_some());

    // A second identical answer cannot move tracking backwards
    poller(&env).sweep().await;
    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.external_status, Some(ExternalStatus::Processing));
}

#[tokio::test]
async fn test_failed_on_primary_with_fallback_invokes_fallback() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), Some(FALLBACK_PROVIDER)).await;
    let order_id = in_flight_order(&env, "EXT-P1").await;

    let primary = env.factory.mock_for(PRIMARY_PROVIDER);
    primary.set_check("EXT-P1", Ok(check("EXT-P1", MappedStatus::Failed, None)));
    let fallback = env.factory.mock_for(FALLBACK_PROVIDER);
    fallback.push_place(Ok(placed("FB-NEW", MappedStatus::Success)));

    poller(&env).sweep().await;

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(
        order.provider_id,
        Some(FALLBACK_PROVIDER),
        "poller must invoke the fallback path"
    );
    assert_eq!(order.external_ref.as_deref(), Some("FB-NEW"));
    assert_eq!(order.status, OrderStatus::Approved);
}

#[tokio::test]
async fn test_failed_on_fallback_rejects_and_refunds() {
    let env = setup().await;
    let start = user_balance(&env.pool).await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), Some(FALLBACK_PROVIDER)).await;

    // Primary refuses outright, fallback accepts and stays pending
    let primary = env.factory.mock_for(PRIMARY_PROVIDER);
    primary.push_place(Err(AdapterError::Provider {
        code: "20".into(),
        message: "Out of stock".into(),
    }));
    let fallback = env.factory.mock_for(FALLBACK_PROVIDER);
    fallback.push_place(Ok(placed("FB-WAIT", MappedStatus::Pending)));

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();
    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.provider_id, Some(FALLBACK_PROVIDER));

    // The fallback later reports a terminal failure → no second fallback
    fallback.set_check("FB-WAIT", Ok(check("FB-WAIT", MappedStatus::Failed, None)));
    poller(&env).sweep().await;

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(order.external_status, Some(ExternalStatus::Failed));
    assert_eq!(user_balance(&env.pool).await, start);
}

#[tokio::test]
async fn test_one_provider_error_does_not_abort_the_batch() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), None).await;
    let broken_id = in_flight_order(&env, "EXT-BROKEN").await;

    // Second order on the fallback provider (as its primary)
    route_external(&env.pool, Some(FALLBACK_PROVIDER), None).await;
    let healthy = env.factory.mock_for(FALLBACK_PROVIDER);
    healthy.push_place(Ok(placed("EXT-FINE", MappedStatus::Pending)));
    let healthy_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, healthy_id).await.unwrap();

    // One provider's check blows up, the other resolves
    let broken = env.factory.mock_for(PRIMARY_PROVIDER);
    broken.set_check(
        "EXT-BROKEN",
        Err(AdapterError::Malformed("HTML response".into())),
    );
    healthy.set_check("EXT-FINE", Ok(check("EXT-FINE", MappedStatus::Success, None)));

    poller(&env).sweep().await;

    let broken_order = order_row(&env.pool, broken_id).await;
    let healthy_order = order_row(&env.pool, healthy_id).await;
    // The failing check left its order in the last safe state...
    assert_eq!(broken_order.status, OrderStatus::Pending);
    assert_eq!(broken_order.external_status, Some(ExternalStatus::Sent));
    // ...and did not prevent the healthy one from finishing
    assert_eq!(healthy_order.status, OrderStatus::Approved);
}

#[tokio::test]
async fn test_terminal_orders_are_skipped() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), None).await;
    let order_id = in_flight_order(&env, "EXT-LATE").await;

    // Admin approves manually before the poller gets to it
    env.orders
        .update_status(TENANT, order_id, OrderStatus::Approved, "admin")
        .await
        .unwrap();

    let mock = env.factory.mock_for(PRIMARY_PROVIDER);
    mock.set_check("EXT-LATE", Ok(check("EXT-LATE", MappedStatus::Failed, None)));
    poller(&env).sweep().await;

    // A late failure answer cannot touch a terminal order
    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Approved);
    assert_eq!(order.external_status, Some(ExternalStatus::Sent));
}
