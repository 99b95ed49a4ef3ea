//! Store Server - 多租户数字商品履约与记账引擎
//!
//! # 架构概述
//!
//! 本模块是服务主入口，提供以下核心功能：
//!
//! - **订单核心** (`orders`): 状态机、钱包、FX 冻结、调度、对账
//! - **供应商适配** (`providers`): 异构外部 API 的统一契约
//! - **数据库** (`db`): SQLite (sqlx) 存储和 repository 层
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、后台任务、服务器
//! ├── auth/          # 网关身份头解析
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单状态机、调度、对账、FX 冻结
//! ├── providers/     # 供应商适配器 (VoltPin / OrbitPay / Mock)
//! ├── services/      # 通知投递
//! ├── db/            # 数据库层
//! └── utils/         # 错误、日志、时间工具
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod providers;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::RequestContext;
pub use core::{Config, Server, ServerState};
pub use orders::{DispatchOrchestrator, OrderService, ReconciliationPoller};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
