//! 服务器状态 - 持有所有服务的单例引用
//!
//! ServerState 是整个服务的核心数据结构，持有数据库连接池和各服务的
//! 共享引用。使用 Arc 实现浅拷贝，所有权成本极低。
//!
//! # 服务组件
//!
//! | 字段 | 类型 | 说明 |
//! |------|------|------|
//! | config | Config | 配置项 (不可变) |
//! | pool | SqlitePool | SQLite 连接池 |
//! | orders | Arc<OrderService> | 订单状态机 + 钱包 |
//! | dispatcher | Arc<DispatchOrchestrator> | 履约调度 |
//! | registry | Arc<ProviderRegistry> | 供应商适配器注册表 |

use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::orders::{DispatchOrchestrator, OrderService, ReconciliationPoller};
use crate::providers::{AdapterFactory, ProviderRegistry};
use crate::services::{NotificationService, NotificationWorker};
use sqlx::SqlitePool;
use std::time::Duration;

#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// 订单状态机 + 钱包
    pub orders: Arc<OrderService>,
    /// 履约调度器
    pub dispatcher: Arc<DispatchOrchestrator>,
    /// 供应商注册表 (生产 adapter 工厂 + 目录缓存)
    pub registry: Arc<ProviderRegistry>,
    /// 对账轮询使用的 adapter 工厂 (测试可注入 mock)
    factory: Arc<dyn AdapterFactory>,
    /// 全局取消令牌
    shutdown: CancellationToken,
    /// 通知投递 worker，在 start_background_tasks 时取出并 spawn
    notification_worker: Arc<Mutex<Option<NotificationWorker>>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        let db = DbService::new(&config.db_path)
            .await
            .expect("Failed to initialize database");
        let registry = Arc::new(ProviderRegistry::new(config));
        let factory: Arc<dyn AdapterFactory> = registry.clone();
        Self::build(config.clone(), db.pool, registry, factory)
    }

    /// 手动构造 (测试注入 in-memory pool / mock factory)
    pub fn build(
        config: Config,
        pool: SqlitePool,
        registry: Arc<ProviderRegistry>,
        factory: Arc<dyn AdapterFactory>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let (notifications, worker) =
            NotificationService::new(config.notify_webhook_url.clone(), shutdown.clone());
        let orders = Arc::new(OrderService::new(
            pool.clone(),
            config.timezone(),
            notifications,
        ));
        let dispatcher = Arc::new(DispatchOrchestrator::new(
            pool.clone(),
            factory.clone(),
            orders.clone(),
            config.provider_retry_backoff_ms,
        ));

        Self {
            config,
            pool,
            orders,
            dispatcher,
            registry,
            factory,
            shutdown,
            notification_worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用。启动的任务：
    /// - 通知投递 worker
    /// - 对账轮询 (Reconciliation Poller)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        if let Some(worker) = self
            .notification_worker
            .lock()
            .ok()
            .and_then(|mut g| g.take())
        {
            tasks.spawn("notification_worker", TaskKind::Worker, worker.run());
        }

        let poller = ReconciliationPoller::new(
            self.pool.clone(),
            self.factory.clone(),
            self.orders.clone(),
            self.dispatcher.clone(),
            Duration::from_secs(self.config.poll_interval_secs),
            self.config.poll_batch,
            tasks.shutdown_token(),
        );
        tasks.spawn("reconciliation_poller", TaskKind::Periodic, poller.run());
    }
}
