//! Dispatch orchestrator scenarios: code inventory, provider fallback,
//! idempotency.

mod common;

use common::*;
use shared::models::code::CodeImportItem;
use shared::models::{CodeStatus, ExternalStatus, OrderStatus};
use store_server::db::repository::{code, dispatch_log};
use store_server::providers::{AdapterError, MappedStatus};

async fn seed_code_group(env: &TestEnv, codes: &[(&str, f64)]) -> i64 {
    let group = code::create_group(&env.pool, TENANT, "MLBB pins")
        .await
        .unwrap();
    let items: Vec<CodeImportItem> = codes
        .iter()
        .map(|(pin, cost)| CodeImportItem {
            pin: pin.to_string(),
            serial: None,
            cost_usd: *cost,
        })
        .collect();
    code::import_items(&env.pool, TENANT, group.id, &items)
        .await
        .unwrap();
    route_codes(&env.pool, group.id).await;
    group.id
}

// ============================================================================
// 1. Internal codes
// ============================================================================

#[tokio::test]
async fn test_internal_codes_fulfills_and_approves_in_one_step() {
    let env = setup().await;
    let group_id = seed_code_group(&env, &[("PIN-AAAA", 22.0)]).await;

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Approved);
    assert_eq!(order.cost_amount, Some(22.0));
    assert!(order.fx_locked, "approval must freeze the snapshot");
    // cost 22 USD × rate 30 = 660 home
    assert_eq!(order.cost_home, Some(660.0));

    // Code attached to the order and delivered via notes
    let items = code::list_items(&env.pool, TENANT, group_id).await.unwrap();
    assert_eq!(items[0].status, CodeStatus::Used);
    assert_eq!(items[0].order_id, Some(order_id));
    let view = env.orders.view(TENANT, order_id).await.unwrap();
    assert!(view.notes.iter().any(|n| n.text.contains("PIN-AAAA")));
}

#[tokio::test]
async fn test_single_code_cannot_be_consumed_by_two_orders() {
    let env = setup().await;
    seed_code_group(&env, &[("PIN-ONLY", 22.0)]).await;

    let a = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    let b = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;

    // Concurrent dispatch of both orders against one remaining code
    let (ra, rb) = tokio::join!(
        env.dispatcher.dispatch(TENANT, a),
        env.dispatcher.dispatch(TENANT, b)
    );
    ra.unwrap();
    rb.unwrap();

    let order_a = order_row(&env.pool, a).await;
    let order_b = order_row(&env.pool, b).await;
    let approved = [&order_a, &order_b]
        .iter()
        .filter(|o| o.status == OrderStatus::Approved)
        .count();
    let pending = [&order_a, &order_b]
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count();
    assert_eq!(approved, 1, "exactly one order wins the code");
    assert_eq!(pending, 1, "the loser stays pending for manual handling");

    // The code is attached to exactly one order
    let used_by = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT order_id) FROM code_item WHERE order_id IS NOT NULL",
    )
    .fetch_one(&env.pool)
    .await
    .unwrap();
    assert_eq!(used_by, 1);

    // The loser got a logged "no codes available" dispatch failure
    let loser = if order_a.status == OrderStatus::Pending { a } else { b };
    let logs = dispatch_log::list_for_order(&env.pool, TENANT, loser)
        .await
        .unwrap();
    assert!(
        logs.iter().any(|l| l.message.contains("no codes available")),
        "loser must have a logged dispatch failure"
    );
}

// ============================================================================
// 2. External providers
// ============================================================================

#[tokio::test]
async fn test_dispatch_is_idempotent_one_external_call() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), None).await;
    let mock = env.factory.mock_for(PRIMARY_PROVIDER);
    mock.push_place(Ok(placed("EXT-1", MappedStatus::Pending)));

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;

    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();

    assert_eq!(mock.place_call_count(), 1, "second dispatch must be a no-op");
    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.external_ref.as_deref(), Some("EXT-1"));
    assert_eq!(order.external_status, Some(ExternalStatus::Sent));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.attempts, 1);
}

#[tokio::test]
async fn test_primary_error_falls_back_and_approves() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), Some(FALLBACK_PROVIDER)).await;
    let primary = env.factory.mock_for(PRIMARY_PROVIDER);
    let fallback = env.factory.mock_for(FALLBACK_PROVIDER);
    primary.push_place(Err(AdapterError::Provider {
        code: "20".into(),
        message: "Out of stock".into(),
    }));
    fallback.push_place(Ok(placed("FB-9", MappedStatus::Success)));

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Approved);
    assert_eq!(order.provider_id, Some(FALLBACK_PROVIDER));
    assert_eq!(order.external_status, Some(ExternalStatus::Done));
    // Authoritative cost from the placed-order response (27.5 USD)
    assert_eq!(order.cost_amount, Some(27.5));
    assert!(order.completed_at.is_some());
    assert!(order.duration_ms.is_some());

    // Dispatch log: one fail (primary), one success (fallback)
    let logs = dispatch_log::list_for_order(&env.pool, TENANT, order_id)
        .await
        .unwrap();
    let fails = logs
        .iter()
        .filter(|l| l.result == shared::models::DispatchResult::Fail)
        .count();
    let successes = logs
        .iter()
        .filter(|l| l.result == shared::models::DispatchResult::Success)
        .count();
    assert_eq!(fails, 1);
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_immediate_terminal_failure_triggers_fallback() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), Some(FALLBACK_PROVIDER)).await;
    let primary = env.factory.mock_for(PRIMARY_PROVIDER);
    let fallback = env.factory.mock_for(FALLBACK_PROVIDER);
    // Primary answers, but the mapped status is an immediate terminal failure
    primary.push_place(Ok(placed("P-DEAD", MappedStatus::Failed)));
    fallback.push_place(Ok(placed("FB-OK", MappedStatus::Pending)));

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
    assert_eq!(order.external_ref.as_deref(), Some("FB-OK"));
    assert_eq!(order.external_status, Some(ExternalStatus::Sent));
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_both_providers_fail_rejects_and_refunds() {
    let env = setup().await;
    let start = user_balance(&env.pool).await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), Some(FALLBACK_PROVIDER)).await;
    let primary = env.factory.mock_for(PRIMARY_PROVIDER);
    let fallback = env.factory.mock_for(FALLBACK_PROVIDER);
    primary.push_place(Err(AdapterError::Provider {
        code: "20".into(),
        message: "Out of stock".into(),
    }));
    fallback.push_place(Err(AdapterError::Provider {
        code: "30".into(),
        message: "Disabled".into(),
    }));

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    assert_eq!(user_balance(&env.pool).await, start - TOTAL_THB);

    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(order.external_status, Some(ExternalStatus::Failed));
    assert!(order.completed_at.is_some());
    // Refunded
    assert_eq!(user_balance(&env.pool).await, start);

    let logs = dispatch_log::list_for_order(&env.pool, TENANT, order_id)
        .await
        .unwrap();
    assert_eq!(
        logs.iter()
            .filter(|l| l.result == shared::models::DispatchResult::Fail)
            .count(),
        2
    );
}

#[tokio::test]
async fn test_unmapped_package_counts_as_provider_failure() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), None).await;
    // Remove the mapping so the attempt fails before any call
    sqlx::query("DELETE FROM provider_cost WHERE package_id = ? AND provider_id = ?")
        .bind(PACKAGE)
        .bind(PRIMARY_PROVIDER)
        .execute(&env.pool)
        .await
        .unwrap();

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Rejected);
    let mock = env.factory.mock_for(PRIMARY_PROVIDER);
    assert_eq!(mock.place_call_count(), 0, "no call without a mapping");
}

#[tokio::test]
async fn test_manual_routing_leaves_order_pending() {
    let env = setup().await;
    // No routing row at all → manual

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();

    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.provider_id, None);
    assert_eq!(order.external_status, None);
}

#[tokio::test]
async fn test_transport_error_is_retried_once_with_same_key() {
    let env = setup().await;
    route_external(&env.pool, Some(PRIMARY_PROVIDER), None).await;
    let mock = env.factory.mock_for(PRIMARY_PROVIDER);
    mock.push_place(Err(AdapterError::Transport("connection reset".into())));
    mock.push_place(Ok(placed("EXT-RETRY", MappedStatus::Pending)));

    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.dispatcher.dispatch(TENANT, order_id).await.unwrap();

    assert_eq!(mock.place_call_count(), 2, "one bounded retry");
    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.external_ref.as_deref(), Some("EXT-RETRY"));
    // A retried call is still one dispatch attempt
    assert_eq!(order.attempts, 1);
}
