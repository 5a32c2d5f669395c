// crates/mg_foundation/src/lib.rs

//! MeteoGrid Foundation Layer
//!
//! 基础层，提供整个工作区共享的最小抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `MgError` 与 `MgResult`
//! - [`nodata`]: 外部接口处的无数据哨兵值与 `Option<f64>` 之间的转换
//!
//! # 示例
//!
//! ```
//! use mg_foundation::error::{MgError, MgResult};
//! use mg_foundation::nodata;
//!
//! fn first_valid(raw: &[f64]) -> MgResult<f64> {
//!     raw.iter()
//!         .find_map(|&v| nodata::to_option(v))
//!         .ok_or_else(|| MgError::no_data("测站数据"))
//! }
//!
//! assert_eq!(first_valid(&[-999.0, 12.5]).unwrap(), 12.5);
//! assert!(first_valid(&[-999.0]).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod nodata;

// 重导出常用类型
pub use error::{MgError, MgResult};
