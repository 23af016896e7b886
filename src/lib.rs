//! Courier Core 公共库
//!
//! 提供统一的配置加载、错误类型、指标收集与日志初始化功能

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod utils;

pub use config::{
    AppConfig, ClusterConfig, ConsistencyConfig, PagingConfig, WriteConfig, app_config,
    load_config,
};
pub use error::*;
pub use utils::*;
