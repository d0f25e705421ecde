//! 服务器配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | SHOP_ADDRESS | 200 Example Avenue | 门店地址 (配送起点) |
//! | MAX_DELIVERY_DISTANCE_M | 5000 | 配送距离上限 (距离单位) |
//! | PAYMENT_TIMEOUT_MINUTES | 15 | 待付款订单超时时间 |
//! | PAYMENT_SWEEP_INTERVAL_SECS | 60 | 支付超时扫描间隔 |
//! | COMPLETION_SWEEP_HOUR | 1 | 派送完成扫描触发时刻 (0-23) |
//! | COMPLETION_GRACE_MINUTES | 60 | 派送订单宽限时间 |
//! | CACHE_TTL_SECS | 3600 | 结果缓存 TTL |
//! | FILTER_EXPECTED_INSERTIONS | 2048 | 存在过滤器期望插入数 |
//! | FILTER_FALSE_POSITIVE_RATE | 0.01 | 存在过滤器误判率 |
//! | ROUTE_API_URL | (empty) | 路线规划服务地址 |
//! | ROUTE_API_KEY | (empty) | 路线规划服务密钥 |
//! | LOG_DIR | (empty) | 日志目录 (为空则仅控制台) |
//! | ENVIRONMENT | development | 运行环境 |
//!
//! # 示例
//!
//! ```ignore
//! MAX_DELIVERY_DISTANCE_M=8000 CACHE_TTL_SECS=600 cargo run
//! ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 门店地址，配送路线规划的固定起点
    pub shop_address: String,
    /// 配送距离上限 (距离单位，路线服务返回值)
    pub max_delivery_distance_m: u32,
    /// 待付款订单超时时间 (分钟)
    pub payment_timeout_minutes: i64,
    /// 支付超时扫描间隔 (秒)
    pub payment_sweep_interval_secs: u64,
    /// 派送完成扫描触发时刻 (0-23, 选在低峰)
    pub completion_sweep_hour: u32,
    /// 派送中订单在被强制完成前的宽限时间 (分钟)
    pub completion_grace_minutes: i64,
    /// 结果缓存 TTL (秒)
    pub cache_ttl_secs: u64,
    /// 存在过滤器期望插入数 (构造时固定)
    pub filter_expected_insertions: usize,
    /// 存在过滤器目标误判率 (构造时固定)
    pub filter_false_positive_rate: f64,
    /// 路线规划服务地址 (为空则使用固定距离桩)
    pub route_api_url: String,
    /// 路线规划服务密钥
    pub route_api_key: String,
    /// 日志目录
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            shop_address: std::env::var("SHOP_ADDRESS")
                .unwrap_or_else(|_| "200 Example Avenue".into()),
            max_delivery_distance_m: std::env::var("MAX_DELIVERY_DISTANCE_M")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            payment_timeout_minutes: std::env::var("PAYMENT_TIMEOUT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            payment_sweep_interval_secs: std::env::var("PAYMENT_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            completion_sweep_hour: std::env::var("COMPLETION_SWEEP_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            completion_grace_minutes: std::env::var("COMPLETION_GRACE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            filter_expected_insertions: std::env::var("FILTER_EXPECTED_INSERTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2048),
            filter_false_positive_rate: std::env::var("FILTER_FALSE_POSITIVE_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.01),
            route_api_url: std::env::var("ROUTE_API_URL").unwrap_or_default(),
            route_api_key: std::env::var("ROUTE_API_KEY").unwrap_or_default(),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 结果缓存 TTL
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
