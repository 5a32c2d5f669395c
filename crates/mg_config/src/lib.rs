// crates/mg_config/src/lib.rs

//! MeteoGrid Config Layer
//!
//! 插值引擎的配置层：每个气象参数的候选算法列表、栅格缓存容量、
//! 可用性清单时间窗和算法失败策略。
//!
//! # 模块概览
//!
//! - [`engine_config`]: `EngineConfig` 及其子配置
//! - [`error`]: 配置错误类型
//!
//! # 示例
//!
//! ```
//! use mg_config::{EngineConfig, FailurePolicy};
//! use mg_meteo::MeteoParam;
//!
//! let config = EngineConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.failure_policy, FailurePolicy::FailLoudly);
//! assert!(!config.candidates(MeteoParam::Ta).is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine_config;
pub mod error;

// 重导出核心类型
pub use engine_config::{
    AlgorithmEntry, CacheConfig, EngineConfig, FailurePolicy, GridWindowConfig,
    MAX_WINDOW_HOURS,
};
pub use error::ConfigError;
