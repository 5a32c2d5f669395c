// crates/mg_terrain/src/lib.rs

//! 栅格与地形数据管理
//!
//! 提供二维场栅格和数字高程模型的存储与访问。
//!
//! # 模块
//!
//! - `grid`: 二维场栅格 `Grid2D` 及其几何 `GridGeometry`
//! - `dem`: 地形模型 `TerrainModel`（高程 + 坡度/坡向/曲率派生层）
//! - `derivatives`: 3×3 邻域差分算子

pub mod dem;
pub mod derivatives;
pub mod grid;

// 重导出常用类型
pub use dem::{TerrainLayers, TerrainModel, TerrainStats};
pub use grid::{Grid2D, GridGeometry, NodataHandling};
