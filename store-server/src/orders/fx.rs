//! FX Freeze — the approval snapshot
//!
//! Idempotent procedure invoked on entry to `approved`: converts the
//! order's USD sell price into the tenant's home currency at the
//! then-current rate, computes the authoritative cost and profit, and
//! stamps the approval date/month in the business time zone. Once
//! `fx_locked` is set the values never change, whatever happens to the
//! live rate table; reverting the order clears them.

use super::money;
use super::service::{OrderError, OrderResult};
use crate::db::repository::order::FxSnapshot;
use crate::db::repository::{catalog, currency, order, tenant};
use chrono_tz::Tz;
use shared::models::{Order, OrderStatus};
use sqlx::SqlitePool;

/// Freeze the approval snapshot for an order. Returns `true` when the
/// snapshot was written, `false` when the call was a no-op (already
/// frozen, or no longer approved).
pub async fn freeze(pool: &SqlitePool, tz: Tz, tenant_id: i64, order_id: i64) -> OrderResult<bool> {
    let order = order::find_by_id(pool, tenant_id, order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))?;

    if order.status != OrderStatus::Approved || order.fx_locked {
        return Ok(false);
    }

    let tenant = tenant::find_by_id(pool, tenant_id)
        .await?
        .ok_or(OrderError::TenantNotFound(tenant_id))?;

    let rate_home = home_rate(pool, tenant_id, &tenant.home_currency).await?;
    let sell_home = money::usd_to(order.total_usd, rate_home);
    let cost_usd = authoritative_cost_usd(pool, &order).await?;
    let cost_home = money::usd_to(cost_usd, rate_home);
    let profit_home = money::round2(sell_home - cost_home);

    let approved_at = shared::util::now_millis();
    let local = crate::utils::time::local_date(approved_at, tz)
        .ok_or_else(|| OrderError::Internal("approval timestamp out of range".into()))?;

    let snap = FxSnapshot {
        fx_rate: rate_home,
        sell_home,
        cost_home,
        profit_home,
        approved_at,
        approval_date: crate::utils::time::date_key(local),
        approval_month: crate::utils::time::month_key(local),
    };

    // Guarded UPDATE: a concurrent revert or double freeze makes this a no-op
    let written = order::write_fx_snapshot(pool, order.id, &snap).await?;
    if written {
        tracing::info!(
            order_id = order.id,
            rate = rate_home,
            sell_home,
            cost_home,
            profit_home,
            date = %snap.approval_date,
            "FX snapshot frozen"
        );
    }
    Ok(written)
}

/// Home-currency-per-USD rate; USD home needs no table entry.
async fn home_rate(pool: &SqlitePool, tenant_id: i64, home: &str) -> OrderResult<f64> {
    if home.eq_ignore_ascii_case("USD") {
        return Ok(1.0);
    }
    currency::find_rate(pool, tenant_id, home)
        .await?
        .ok_or_else(|| OrderError::CurrencyMissing(home.to_string()))
}

/// Cost in USD, preferring the cost recorded at dispatch time (provider
/// quote or consumed code), falling back to the package base cost.
async fn authoritative_cost_usd(pool: &SqlitePool, order: &Order) -> OrderResult<f64> {
    if let (Some(amount), Some(ccy)) = (order.cost_amount, order.cost_currency.as_deref()) {
        if ccy.eq_ignore_ascii_case("USD") {
            return Ok(amount);
        }
        let rate = currency::find_rate(pool, order.tenant_id, ccy)
            .await?
            .ok_or_else(|| OrderError::CurrencyMissing(ccy.to_string()))?;
        return Ok(money::to_usd(amount, rate));
    }

    // Manual/unmapped orders: package base cost × quantity
    match catalog::find_package(pool, order.tenant_id, order.package_id).await? {
        Some(package) => Ok(money::line_total(package.base_cost_usd, order.quantity)),
        None => {
            tracing::warn!(
                order_id = order.id,
                package_id = order.package_id,
                "Package missing while freezing cost, assuming zero"
            );
            Ok(0.0)
        }
    }
}
