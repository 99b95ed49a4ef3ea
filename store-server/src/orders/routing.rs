//! Routing Resolver
//!
//! Pure read of the per-package routing configuration. Three mutually
//! exclusive outcomes, evaluated in priority order: internal codes →
//! external (primary/fallback) → manual. Writes normalize the stored row
//! so the invariants can never be violated by an admin update.

use crate::db::repository::{RepoResult, routing};
use shared::models::{FulfillmentType, RoutingConfig, RoutingMode, RoutingUpdate};
use sqlx::SqlitePool;

/// Resolved fulfillment decision for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRouting {
    /// No automated routing; the order stays pending for a human
    Manual,
    /// Consume one code from this group
    InternalCodes { code_group_id: i64 },
    /// Try primary, then fallback
    External {
        primary: Option<i64>,
        fallback: Option<i64>,
    },
}

/// Resolve the routing decision for a package. Missing configuration
/// means manual handling.
pub async fn resolve(
    pool: &SqlitePool,
    tenant_id: i64,
    package_id: i64,
) -> RepoResult<ResolvedRouting> {
    let config = routing::find_for_package(pool, tenant_id, package_id).await?;
    Ok(config.map(classify).unwrap_or(ResolvedRouting::Manual))
}

/// Priority: internal codes → external → manual.
fn classify(config: RoutingConfig) -> ResolvedRouting {
    if config.fulfillment == FulfillmentType::InternalCodes
        && let Some(group) = config.code_group_id
    {
        return ResolvedRouting::InternalCodes {
            code_group_id: group,
        };
    }
    if config.primary_provider_id.is_some() || config.fallback_provider_id.is_some() {
        return ResolvedRouting::External {
            primary: config.primary_provider_id,
            fallback: config.fallback_provider_id,
        };
    }
    ResolvedRouting::Manual
}

/// Normalize an update into a consistent row:
/// - internal codes ⇒ code group required, provider IDs cleared
/// - external ⇒ at least one provider required, code group cleared,
///   mode computed from the presence of providers
/// - manual ⇒ everything cleared
pub fn normalize(
    tenant_id: i64,
    package_id: i64,
    update: RoutingUpdate,
) -> Result<RoutingConfig, String> {
    let now = shared::util::now_millis();
    let config = match update.fulfillment {
        FulfillmentType::InternalCodes => {
            let group = update
                .code_group_id
                .ok_or("internal_codes routing requires a code group")?;
            RoutingConfig {
                package_id,
                tenant_id,
                mode: RoutingMode::Auto,
                fulfillment: FulfillmentType::InternalCodes,
                primary_provider_id: None,
                fallback_provider_id: None,
                code_group_id: Some(group),
                updated_at: now,
            }
        }
        FulfillmentType::External => {
            if update.primary_provider_id.is_none() && update.fallback_provider_id.is_none() {
                return Err("external routing requires a primary or fallback provider".into());
            }
            RoutingConfig {
                package_id,
                tenant_id,
                mode: RoutingMode::Auto,
                fulfillment: FulfillmentType::External,
                primary_provider_id: update.primary_provider_id,
                fallback_provider_id: update.fallback_provider_id,
                code_group_id: None,
                updated_at: now,
            }
        }
        FulfillmentType::Manual => RoutingConfig {
            package_id,
            tenant_id,
            mode: RoutingMode::Manual,
            fulfillment: FulfillmentType::Manual,
            primary_provider_id: None,
            fallback_provider_id: None,
            code_group_id: None,
            updated_at: now,
        },
    };
    Ok(config)
}

/// Normalize and persist a routing update.
pub async fn update(
    pool: &SqlitePool,
    tenant_id: i64,
    package_id: i64,
    payload: RoutingUpdate,
) -> RepoResult<RoutingConfig> {
    let config = normalize(tenant_id, package_id, payload)
        .map_err(crate::db::repository::RepoError::Validation)?;
    routing::upsert(pool, &config).await?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_payload(
        fulfillment: FulfillmentType,
        primary: Option<i64>,
        fallback: Option<i64>,
        group: Option<i64>,
    ) -> RoutingUpdate {
        RoutingUpdate {
            fulfillment,
            primary_provider_id: primary,
            fallback_provider_id: fallback,
            code_group_id: group,
        }
    }

    #[test]
    fn test_internal_codes_clears_providers() {
        let config = normalize(
            1,
            10,
            update_payload(FulfillmentType::InternalCodes, Some(7), Some(8), Some(99)),
        )
        .unwrap();
        assert_eq!(config.code_group_id, Some(99));
        assert_eq!(config.primary_provider_id, None);
        assert_eq!(config.fallback_provider_id, None);
        assert_eq!(config.mode, RoutingMode::Auto);
    }

    #[test]
    fn test_internal_codes_requires_group() {
        assert!(normalize(
            1,
            10,
            update_payload(FulfillmentType::InternalCodes, None, None, None)
        )
        .is_err());
    }

    #[test]
    fn test_external_clears_code_group() {
        let config = normalize(
            1,
            10,
            update_payload(FulfillmentType::External, Some(7), None, Some(99)),
        )
        .unwrap();
        assert_eq!(config.code_group_id, None);
        assert_eq!(config.primary_provider_id, Some(7));
    }

    #[test]
    fn test_manual_clears_everything() {
        let config = normalize(
            1,
            10,
            update_payload(FulfillmentType::Manual, Some(7), Some(8), Some(99)),
        )
        .unwrap();
        assert_eq!(config.mode, RoutingMode::Manual);
        assert_eq!(config.primary_provider_id, None);
        assert_eq!(config.code_group_id, None);
    }

    #[test]
    fn test_classify_priority_codes_over_external() {
        // A row that somehow has both set still resolves to codes first
        let config = RoutingConfig {
            package_id: 10,
            tenant_id: 1,
            mode: RoutingMode::Auto,
            fulfillment: FulfillmentType::InternalCodes,
            primary_provider_id: Some(7),
            fallback_provider_id: None,
            code_group_id: Some(99),
            updated_at: 0,
        };
        assert_eq!(
            classify(config),
            ResolvedRouting::InternalCodes { code_group_id: 99 }
        );
    }
}
