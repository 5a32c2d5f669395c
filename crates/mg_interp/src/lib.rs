// crates/mg_interp/src/lib.rs

//! MeteoGrid 空间插值
//!
//! 把稀疏的测站观测重建为 DEM 上的完整二维场。
//!
//! # 模块
//!
//! - [`numerics`]: 统计、反距离权重、海拔回归、去趋势
//! - [`algorithms`]: 插值算法族，每个算法自评分并填充栅格
//! - [`registry`]: 算法名与参数的解析
//! - [`interpolator`]: 评分、选择、计算与缓存的调度器
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use chrono::TimeZone;
//! use mg_config::{AlgorithmEntry, EngineConfig};
//! use mg_geo::Coords;
//! use mg_grids::MemoryGridSource;
//! use mg_interp::Interpolator;
//! use mg_meteo::{MemoryObservations, MeteoData, MeteoParam, StationData};
//! use mg_terrain::{Grid2D, GridGeometry, TerrainModel};
//!
//! let date = chrono::Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap();
//! let observations: MemoryObservations = [(1000.0, 280.0), (1500.0, 276.0), (2000.0, 272.0)]
//!     .iter()
//!     .enumerate()
//!     .map(|(k, &(z, ta))| {
//!         let station = StationData::new(format!("S{k}"), Coords::new(k as f64 * 500.0, 0.0, z));
//!         MeteoData::new(date, station).with(MeteoParam::Ta, ta)
//!     })
//!     .collect();
//!
//! let mut config = EngineConfig::empty();
//! config.set_candidates(MeteoParam::Ta, vec![AlgorithmEntry::new("IDW_LAPSE")]);
//! let engine = Interpolator::new(
//!     config,
//!     Arc::new(observations),
//!     Arc::new(MemoryGridSource::new()),
//! )
//! .unwrap();
//!
//! let geometry = GridGeometry::new(3, 3, 100.0, Coords::default());
//! let dem = TerrainModel::new(Grid2D::new(geometry, Some(1750.0)));
//! let mut ta = Grid2D::empty(geometry);
//! engine.calculate(date, MeteoParam::Ta, &dem, &mut ta).unwrap();
//! assert!((ta.get(1, 1).unwrap() - 274.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod interpolator;
pub mod numerics;
pub mod registry;

pub use algorithms::{AlgorithmContext, FieldProvider, InterpolationAlgorithm, Measurement};
pub use interpolator::Interpolator;
pub use registry::{AlgorithmKind, AlgorithmRegistry, AlgorithmSpec};
