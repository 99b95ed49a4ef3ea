//! Order Fulfillment & Ledger Engine
//!
//! The transactional core:
//!
//! - [`service`] - order state machine + wallet ledger (创建/审批/驳回)
//! - [`routing`] - per-package fulfillment routing resolver
//! - [`dispatch`] - dispatch orchestrator (codes / primary / fallback)
//! - [`poller`] - reconciliation sweep over in-flight external orders
//! - [`fx`] - approval snapshot (FX freeze)
//! - [`accounting`] - accounting period lock
//! - [`money`] - decimal helpers for monetary arithmetic

pub mod accounting;
pub mod dispatch;
pub mod fx;
pub mod money;
pub mod poller;
pub mod routing;
pub mod service;

pub use dispatch::DispatchOrchestrator;
pub use poller::ReconciliationPoller;
pub use routing::ResolvedRouting;
pub use service::{OrderError, OrderResult, OrderService};
