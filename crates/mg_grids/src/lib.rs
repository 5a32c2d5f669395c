// crates/mg_grids/src/lib.rs

//! MeteoGrid 栅格层
//!
//! # 模块
//!
//! - [`source`]: 栅格数据源接口 `GridSource` 与内存实现
//! - [`cache`]: 有界 FIFO 栅格缓存
//! - [`derivation`]: 参数之间的推导规则
//! - [`manager`]: 组合缓存、数据源与推导的 `GridManager`
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use chrono::TimeZone;
//! use mg_geo::Coords;
//! use mg_grids::{GridManager, MemoryGridSource};
//! use mg_meteo::MeteoParam;
//! use mg_terrain::{Grid2D, GridGeometry};
//!
//! let date = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let geometry = GridGeometry::new(2, 2, 50.0, Coords::default());
//! let source = MemoryGridSource::new();
//! source.insert_grid(MeteoParam::PsumS, date, Grid2D::new(geometry, Some(1.5)));
//! source.insert_grid(MeteoParam::PsumL, date, Grid2D::new(geometry, Some(0.5)));
//!
//! let manager = GridManager::new(Arc::new(source), 10);
//! let psum = manager.resolve(MeteoParam::Psum, date).unwrap();
//! assert_eq!(psum.get(0, 0), Some(2.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod derivation;
pub mod manager;
pub mod source;

pub use cache::{CacheKey, GridCache};
pub use manager::{GridManager, DEM_KEY};
pub use source::{GridInventory, GridSource, MemoryGridSource};
