//! Shared types for the store platform
//!
//! Domain models and wire payloads used by both the server and its
//! clients: orders, routing, code inventory, wallets, accounting periods.
//! 所有核心实体都带租户 ID (tenant_id)。

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
