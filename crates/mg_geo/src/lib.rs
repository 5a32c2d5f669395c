// crates/mg_geo/src/lib.rs

//! MeteoGrid 几何模块
//!
//! 投影坐标下的平面几何类型与基于 R-tree 的空间索引。
//! 坐标投影本身由外部数据源完成，这里只处理已投影的东向/北向坐标。
//!
//! # 模块
//!
//! - `geometry`: 平面点 `Point2D`、测站位置 `Coords` 与方位角折算
//! - `spatial_index`: 基于 R-tree 的近邻查询
//!
//! # 示例
//!
//! ```
//! use mg_geo::prelude::*;
//!
//! let index = SpatialIndex::bulk_load(vec![
//!     (Point2D::new(0.0, 0.0), 0usize),
//!     (Point2D::new(100.0, 0.0), 1),
//!     (Point2D::new(500.0, 0.0), 2),
//! ]);
//! let nearest: Vec<usize> = index
//!     .query_nearest(&Point2D::new(90.0, 0.0), 2)
//!     .into_iter()
//!     .map(|(_, &i)| i)
//!     .collect();
//! assert_eq!(nearest, vec![1, 0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod geometry;
pub mod spatial_index;

/// 预导入模块
pub mod prelude {
    pub use crate::geometry::{normalize_degrees, Coords, Point2D};
    pub use crate::spatial_index::SpatialIndex;
}

// 重导出常用类型
pub use geometry::{normalize_degrees, Coords, Point2D};
pub use spatial_index::SpatialIndex;
