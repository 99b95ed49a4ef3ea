//! Order state machine + wallet ledger scenarios.

mod common;

use common::*;
use shared::models::OrderStatus;
use store_server::orders::OrderError;

// ============================================================================
// 1. Checkout
// ============================================================================

#[tokio::test]
async fn test_insufficient_balance_rejected_with_no_mutation() {
    // balance 100, overdraft 0, package 40 USD, rate 30 → qty 3 needs 3600
    let env = setup_with_balance(100.0, 0.0).await;

    let err = env
        .orders
        .create_order(TENANT, USER, checkout(3))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientBalance { .. }));

    // No state mutated: balance intact, no orders created
    assert_eq!(user_balance(&env.pool).await, 100.0);
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(&env.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_checkout_debits_wallet_and_inserts_pending_order() {
    let env = setup_with_balance(5000.0, 0.0).await;

    let view = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap();

    assert_eq!(view.order.status, OrderStatus::Pending);
    assert_eq!(view.order.total_usd, PACKAGE_PRICE_USD);
    assert_eq!(view.order.total_user_ccy, TOTAL_THB);
    assert_eq!(view.order.user_currency, "THB");
    assert!(view.order.order_no.starts_with("ORD"));
    assert_eq!(user_balance(&env.pool).await, 5000.0 - TOTAL_THB);
}

#[tokio::test]
async fn test_overdraft_allows_negative_balance() {
    // balance 1000, overdraft 500 → 1200 fits
    let env = setup_with_balance(1000.0, 500.0).await;

    env.orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap();
    assert_eq!(user_balance(&env.pool).await, -200.0);
}

#[tokio::test]
async fn test_invalid_quantity_rejected() {
    let env = setup().await;
    let err = env
        .orders
        .create_order(TENANT, USER, checkout(0))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidQuantity(0)));
}

// ============================================================================
// 2. Status transitions + FX freeze
// ============================================================================

#[tokio::test]
async fn test_approve_freezes_snapshot_and_rate_changes_do_not_alter_it() {
    let env = setup().await;
    let start = user_balance(&env.pool).await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;

    let view = env
        .orders
        .update_status(TENANT, order_id, OrderStatus::Approved, "admin")
        .await
        .unwrap();

    // pending → approved applies no extra wallet delta
    assert_eq!(user_balance(&env.pool).await, start - TOTAL_THB);

    let order = view.order;
    assert!(order.fx_locked);
    assert_eq!(order.fx_rate, Some(RATE_THB));
    // sell 40 USD × 30 = 1200 home; cost falls back to package base 25 USD
    assert_eq!(order.sell_home, Some(1200.0));
    assert_eq!(order.cost_home, Some(750.0));
    assert_eq!(order.profit_home, Some(450.0));
    assert!(order.approval_date.is_some());
    assert!(order.approval_month.is_some());

    // Change the live rate; the frozen snapshot must not move
    sqlx::query("UPDATE currency SET rate_per_usd = 99.0 WHERE tenant_id = ? AND code = 'THB'")
        .bind(TENANT)
        .execute(&env.pool)
        .await
        .unwrap();

    let after = order_row(&env.pool, order_id).await;
    assert_eq!(after.fx_rate, Some(RATE_THB));
    assert_eq!(after.sell_home, Some(1200.0));
}

#[tokio::test]
async fn test_revert_to_rejected_refunds_and_clears_snapshot() {
    let env = setup().await;
    let start = user_balance(&env.pool).await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;

    env.orders
        .update_status(TENANT, order_id, OrderStatus::Approved, "admin")
        .await
        .unwrap();
    let view = env
        .orders
        .update_status(TENANT, order_id, OrderStatus::Rejected, "admin")
        .await
        .unwrap();

    // Wallet credited the original total; snapshot fields are gone
    assert_eq!(user_balance(&env.pool).await, start);
    assert_eq!(view.order.status, OrderStatus::Rejected);
    assert!(!view.order.fx_locked);
    assert_eq!(view.order.fx_rate, None);
    assert_eq!(view.order.sell_home, None);
    assert_eq!(view.order.cost_home, None);
    assert_eq!(view.order.profit_home, None);
    assert_eq!(view.order.approval_date, None);
}

#[tokio::test]
async fn test_wallet_deltas_net_out_over_toggle_history() {
    let env = setup().await;
    let start = user_balance(&env.pool).await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(2))
        .await
        .unwrap()
        .order
        .id;
    let total = 2.0 * TOTAL_THB;
    assert_eq!(user_balance(&env.pool).await, start - total);

    // reject → net zero
    env.orders
        .update_status(TENANT, order_id, OrderStatus::Rejected, "admin")
        .await
        .unwrap();
    assert_eq!(user_balance(&env.pool).await, start);

    // re-approve → net one debit
    env.orders
        .update_status(TENANT, order_id, OrderStatus::Approved, "admin")
        .await
        .unwrap();
    assert_eq!(user_balance(&env.pool).await, start - total);

    // reject again → net zero
    env.orders
        .update_status(TENANT, order_id, OrderStatus::Rejected, "admin")
        .await
        .unwrap();
    assert_eq!(user_balance(&env.pool).await, start);
}

#[tokio::test]
async fn test_reapproval_rechecks_overdraft_without_mutation() {
    // Exactly enough for one order
    let env = setup_with_balance(TOTAL_THB, 0.0).await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.orders
        .update_status(TENANT, order_id, OrderStatus::Rejected, "admin")
        .await
        .unwrap();
    assert_eq!(user_balance(&env.pool).await, TOTAL_THB);

    // Drain the wallet behind the order's back
    sqlx::query("UPDATE user SET balance = 0 WHERE id = ?")
        .bind(USER)
        .execute(&env.pool)
        .await
        .unwrap();

    let err = env
        .orders
        .update_status(TENANT, order_id, OrderStatus::Approved, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::OverdraftExceeded));

    // Failed transition mutated nothing
    assert_eq!(user_balance(&env.pool).await, 0.0);
    let order = order_row(&env.pool, order_id).await;
    assert_eq!(order.status, OrderStatus::Rejected);
}

#[tokio::test]
async fn test_same_status_is_noop() {
    let env = setup().await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    let before = user_balance(&env.pool).await;

    let view = env
        .orders
        .update_status(TENANT, order_id, OrderStatus::Pending, "admin")
        .await
        .unwrap();
    assert_eq!(view.order.status, OrderStatus::Pending);
    assert_eq!(user_balance(&env.pool).await, before);
}

#[tokio::test]
async fn test_transition_back_to_pending_is_invalid() {
    let env = setup().await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.orders
        .update_status(TENANT, order_id, OrderStatus::Approved, "admin")
        .await
        .unwrap();

    let err = env
        .orders
        .update_status(TENANT, order_id, OrderStatus::Pending, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition(_)));
}

// ============================================================================
// 3. Closed accounting period
// ============================================================================

#[tokio::test]
async fn test_closed_period_blocks_revert_and_leaves_state_unchanged() {
    let env = setup().await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;
    env.orders
        .update_status(TENANT, order_id, OrderStatus::Approved, "admin")
        .await
        .unwrap();

    let order = order_row(&env.pool, order_id).await;
    let date = order.approval_date.clone().expect("frozen approval date");
    let (year, month) = {
        let mut parts = date.split('-');
        (
            parts.next().unwrap().parse::<i64>().unwrap(),
            parts.next().unwrap().parse::<i64>().unwrap(),
        )
    };

    store_server::orders::accounting::close_month(&env.pool, TENANT, year, month, "cfo", None)
        .await
        .unwrap();

    let balance_before = user_balance(&env.pool).await;
    let err = env
        .orders
        .update_status(TENANT, order_id, OrderStatus::Rejected, "admin")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::PeriodClosed(_)));

    // Balance and status untouched
    assert_eq!(user_balance(&env.pool).await, balance_before);
    let after = order_row(&env.pool, order_id).await;
    assert_eq!(after.status, OrderStatus::Approved);
    assert!(after.fx_locked);
}

// ============================================================================
// 4. Notes
// ============================================================================

#[tokio::test]
async fn test_notes_are_append_only_and_ordered() {
    let env = setup().await;
    let order_id = env
        .orders
        .create_order(TENANT, USER, checkout(1))
        .await
        .unwrap()
        .order
        .id;

    env.orders
        .add_note(TENANT, order_id, "admin", "first")
        .await
        .unwrap();
    let view = env
        .orders
        .add_note(TENANT, order_id, "admin", "second")
        .await
        .unwrap();

    assert_eq!(view.notes.len(), 2);
    assert_eq!(view.notes[0].text, "first");
    assert_eq!(view.notes[1].text, "second");
    assert_eq!(view.notes[0].author, "admin");
}
