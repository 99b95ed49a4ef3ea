//! 服务器配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | /var/lib/store | 工作目录 |
//! | HTTP_PORT | 3000 | HTTP 服务端口 |
//! | DB_PATH | {WORK_DIR}/store.db | SQLite 数据库路径 |
//! | ENVIRONMENT | development | 运行环境 |
//! | BUSINESS_TIMEZONE | Asia/Bangkok | 审批快照使用的业务时区 |
//! | PROVIDER_TIMEOUT_MS | 15000 | 供应商 HTTP 调用超时 |
//! | PROVIDER_RETRY_BACKOFF_MS | 500 | 传输错误重试前的等待 |
//! | POLL_INTERVAL_SECS | 5 | 对账轮询间隔 |
//! | POLL_BATCH | 10 | 每轮对账订单数上限 |
//! | NOTIFY_WEBHOOK_URL | (无) | 状态变更通知 webhook |
//!
//! # 示例
//!
//! ```ignore
//! WORK_DIR=/data/store HTTP_PORT=8080 cargo run
//! ```

use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库路径
    pub db_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 审批快照使用的业务时区 (IANA 名称)
    pub business_timezone: String,
    /// 供应商 HTTP 调用超时 (毫秒)
    pub provider_timeout_ms: u64,
    /// 传输错误重试前的等待 (毫秒)
    pub provider_retry_backoff_ms: u64,
    /// 对账轮询间隔 (秒)
    pub poll_interval_secs: u64,
    /// 每轮对账订单数上限
    pub poll_batch: i64,
    /// 状态变更通知 webhook (未配置则丢弃事件)
    pub notify_webhook_url: Option<String>,
}

impl Config {
    /// 从环境变量加载配置，未设置的使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/store".into());
        let db_path =
            std::env::var("DB_PATH").unwrap_or_else(|_| format!("{work_dir}/store.db"));
        Self {
            work_dir,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            db_path,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            business_timezone: std::env::var("BUSINESS_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Bangkok".into()),
            provider_timeout_ms: std::env::var("PROVIDER_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(15_000),
            provider_retry_backoff_ms: std::env::var("PROVIDER_RETRY_BACKOFF_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(500),
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            poll_batch: std::env::var("POLL_BATCH")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
        }
    }

    /// 使用自定义值覆盖部分配置，常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.db_path = format!("{}/store.db", config.work_dir);
        config.http_port = http_port;
        config
    }

    /// 业务时区；解析失败回退 UTC
    pub fn timezone(&self) -> Tz {
        self.business_timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(
                tz = %self.business_timezone,
                "Invalid BUSINESS_TIMEZONE, falling back to UTC"
            );
            chrono_tz::UTC
        })
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
