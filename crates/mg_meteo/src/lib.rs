// crates/mg_meteo/src/lib.rs

//! 气象数据模型
//!
//! # 模块
//!
//! - [`parameter`]: 气象参数枚举 `MeteoParam` 与物理合理范围
//! - [`data`]: 测站元数据与单时刻点观测 `MeteoData`
//! - [`atmosphere`]: 标准大气、湿度与风矢量换算
//! - [`source`]: 点观测数据提供者接口

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atmosphere;
pub mod data;
pub mod parameter;
pub mod source;

pub use data::{MeteoData, StationData};
pub use parameter::MeteoParam;
pub use source::{MemoryObservations, ObservationSource};

/// 时间戳类型（UTC）
pub type Timestamp = chrono::DateTime<chrono::Utc>;
