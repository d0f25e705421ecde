//! Delivery order backend
//!
//! # Architecture
//!
//! The crate is built around two cores:
//!
//! - **Order lifecycle** (`orders`): the state machine driving every
//!   order from submission to completion, including refund
//!   compensation and the periodic timeout sweeps.
//! - **Cache-aside browse path** (`catalog`): category-keyed catalogue
//!   queries behind a TTL result cache, fronted by a probabilistic
//!   existence filter that rejects impossible keys before they reach
//!   the store.
//!
//! # Module structure
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── store/         # Store traits + in-memory reference store
//! ├── orders/        # 订单状态机 + 超时扫描
//! ├── catalog/       # 存在过滤器、结果缓存、购物车
//! ├── gateway/       # 支付、配送路线、通知 collaborators
//! └── common/        # 日志
//! ```

pub mod catalog;
pub mod common;
pub mod core;
pub mod gateway;
pub mod orders;
pub mod store;

// Re-export 公共类型
pub use crate::core::{AppState, BackgroundTasks, Config, OrderError, OrderResult, TaskKind};
pub use crate::orders::{OrderLifecycle, TimeoutSweeper};

// Re-export logger functions
pub use crate::common::logger::init_logger;
