// crates/mg_terrain/src/dem.rs

//! 地形模型
//!
//! 高程栅格加上坡度、坡向和曲率三个派生层。派生层在构建时计算一次；
//! 之后修改高程（[`TerrainModel::elevation_mut`]）只把模型标记为过期，
//! 派生层保持原值，直到显式调用 [`TerrainModel::update`]。
//!
//! # 示例
//!
//! ```
//! use mg_geo::Coords;
//! use mg_terrain::{Grid2D, GridGeometry, TerrainModel};
//!
//! let geometry = GridGeometry::new(3, 3, 100.0, Coords::default());
//! let dem = TerrainModel::new(Grid2D::new(geometry, Some(1500.0)));
//!
//! assert_eq!(dem.stats().mean_altitude, Some(1500.0));
//! assert_eq!(dem.slope().get(1, 1), Some(0.0));
//! ```

use mg_foundation::error::MgResult;

use crate::derivatives::{aspect_degrees, slope_degrees, Window3x3};
use crate::grid::{Grid2D, GridGeometry, NodataHandling};

/// 需要计算的派生层
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainLayers {
    /// 坡度与坡向
    pub slope: bool,
    /// 曲率
    pub curvature: bool,
}

impl TerrainLayers {
    /// 全部派生层
    pub const ALL: Self = Self {
        slope: true,
        curvature: true,
    };

    /// 不计算派生层
    pub const NONE: Self = Self {
        slope: false,
        curvature: false,
    };
}

impl Default for TerrainLayers {
    fn default() -> Self {
        Self::ALL
    }
}

/// 地形统计量缓存
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TerrainStats {
    /// 最低海拔 [m]
    pub min_altitude: Option<f64>,
    /// 最高海拔 [m]
    pub max_altitude: Option<f64>,
    /// 平均海拔 [m]
    pub mean_altitude: Option<f64>,
    /// 最小坡度 [°]
    pub min_slope: Option<f64>,
    /// 最大坡度 [°]
    pub max_slope: Option<f64>,
    /// 平均坡度 [°]
    pub mean_slope: Option<f64>,
}

/// 地形模型
#[derive(Debug, Clone)]
pub struct TerrainModel {
    elevation: Grid2D,
    slope: Grid2D,
    azimuth: Grid2D,
    curvature: Grid2D,
    layers: TerrainLayers,
    stats: TerrainStats,
    stale: bool,
}

impl TerrainModel {
    /// 由高程栅格构建，计算全部派生层
    pub fn new(elevation: Grid2D) -> Self {
        Self::with_layers(elevation, TerrainLayers::ALL)
    }

    /// 由高程栅格构建，只计算指定的派生层
    pub fn with_layers(elevation: Grid2D, layers: TerrainLayers) -> Self {
        let geometry = *elevation.geometry();
        let mut dem = Self {
            elevation,
            slope: Grid2D::empty(geometry),
            azimuth: Grid2D::empty(geometry),
            curvature: Grid2D::empty(geometry),
            layers,
            stats: TerrainStats::default(),
            stale: true,
        };
        dem.update();
        dem
    }

    /// 重新计算派生层与统计量
    pub fn update(&mut self) {
        let geometry = *self.elevation.geometry();
        self.slope.reset(geometry);
        self.azimuth.reset(geometry);
        self.curvature.reset(geometry);

        if self.layers.slope {
            self.compute_slope();
        }
        if self.layers.curvature {
            self.compute_curvature();
        }
        self.update_stats();
        self.stale = false;

        log::debug!(
            "地形模型已更新: {}x{} 单元, 海拔 [{:?}, {:?}]",
            geometry.ncols,
            geometry.nrows,
            self.stats.min_altitude,
            self.stats.max_altitude
        );
    }

    /// 切换派生层并重新计算
    pub fn set_layers(&mut self, layers: TerrainLayers) {
        self.layers = layers;
        self.update();
    }

    fn compute_slope(&mut self) {
        let cellsize = self.elevation.cellsize();
        for j in 0..self.elevation.nrows() {
            for i in 0..self.elevation.ncols() {
                if let Some(w) = Window3x3::extract(&self.elevation, i, j) {
                    let (dzdx, dzdy) = w.horn_gradient(cellsize);
                    self.slope.set(i, j, Some(slope_degrees(dzdx, dzdy)));
                    self.azimuth.set(i, j, Some(aspect_degrees(dzdx, dzdy)));
                }
            }
        }
    }

    fn compute_curvature(&mut self) {
        let cellsize = self.elevation.cellsize();
        let mut max_abs: f64 = 0.0;
        for j in 0..self.elevation.nrows() {
            for i in 0..self.elevation.ncols() {
                if let Some(w) = Window3x3::extract(&self.elevation, i, j) {
                    let c = w.liston_curvature(cellsize);
                    max_abs = max_abs.max(c.abs());
                    self.curvature.set(i, j, Some(c));
                }
            }
        }

        // 归一化到 [-0.5, 0.5]
        let scale = if max_abs > 0.0 { 0.5 / max_abs } else { 0.0 };
        for v in self.curvature.values_mut().iter_mut().flatten() {
            *v *= scale;
        }
    }

    fn update_stats(&mut self) {
        let parse = NodataHandling::Parse;
        self.stats = TerrainStats {
            min_altitude: self.elevation.min(parse),
            max_altitude: self.elevation.max(parse),
            mean_altitude: self.elevation.mean(parse),
            min_slope: self.slope.min(parse),
            max_slope: self.slope.max(parse),
            mean_slope: self.slope.mean(parse),
        };
    }

    /// 高程栅格
    #[inline]
    pub fn elevation(&self) -> &Grid2D {
        &self.elevation
    }

    /// 可变高程栅格；派生层在 [`update`](Self::update) 之前保持旧值
    pub fn elevation_mut(&mut self) -> &mut Grid2D {
        self.stale = true;
        &mut self.elevation
    }

    /// 坡度 [°]
    #[inline]
    pub fn slope(&self) -> &Grid2D {
        &self.slope
    }

    /// 坡向 [°]
    #[inline]
    pub fn azimuth(&self) -> &Grid2D {
        &self.azimuth
    }

    /// 归一化曲率 [-0.5, 0.5]
    #[inline]
    pub fn curvature(&self) -> &Grid2D {
        &self.curvature
    }

    /// 是否已计算坡度层
    #[inline]
    pub fn has_slope(&self) -> bool {
        self.layers.slope
    }

    /// 是否已计算曲率层
    #[inline]
    pub fn has_curvature(&self) -> bool {
        self.layers.curvature
    }

    /// 派生层是否落后于高程
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// 统计量
    #[inline]
    pub fn stats(&self) -> &TerrainStats {
        &self.stats
    }

    /// 几何
    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        self.elevation.geometry()
    }

    /// 单元海拔
    #[inline]
    pub fn altitude(&self, i: usize, j: usize) -> Option<f64> {
        self.elevation.get(i, j)
    }

    /// 提取子区域
    ///
    /// 派生层直接复制，边缘单元保留原模型中的值；统计量按子区域重算。
    pub fn subset(&self, i0: usize, j0: usize, ncols: usize, nrows: usize) -> MgResult<Self> {
        let mut sub = Self {
            elevation: self.elevation.subset(i0, j0, ncols, nrows)?,
            slope: self.slope.subset(i0, j0, ncols, nrows)?,
            azimuth: self.azimuth.subset(i0, j0, ncols, nrows)?,
            curvature: self.curvature.subset(i0, j0, ncols, nrows)?,
            layers: self.layers,
            stats: TerrainStats::default(),
            stale: self.stale,
        };
        sub.update_stats();
        Ok(sub)
    }
}
