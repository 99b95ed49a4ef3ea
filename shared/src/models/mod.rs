//! Domain Models
//!
//! Serde models shared by the server and clients. With the `db` feature
//! the entity structs also derive `sqlx::FromRow` / `sqlx::Type` so the
//! repository layer can map them straight from SQLite rows.

pub mod accounting;
pub mod catalog;
pub mod code;
pub mod currency;
pub mod dispatch_log;
pub mod order;
pub mod provider;
pub mod routing;
pub mod tenant;
pub mod user;

pub use accounting::{AccountingPeriod, PeriodStatus};
pub use catalog::{Package, PackagePriceOverride, Product};
pub use code::{CodeGroup, CodeGroupCreate, CodeImport, CodeItem, CodeStatus};
pub use currency::Currency;
pub use dispatch_log::{DispatchAction, DispatchLog, DispatchResult};
pub use order::{
    ExternalStatus, Order, OrderCreate, OrderNote, OrderNoteCreate, OrderStatus, OrderView,
};
pub use provider::{Provider, ProviderCost, ProviderKind};
pub use routing::{FulfillmentType, RoutingConfig, RoutingMode, RoutingUpdate};
pub use tenant::Tenant;
pub use user::User;
