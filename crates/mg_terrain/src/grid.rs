// crates/mg_terrain/src/grid.rs

//! 二维场栅格
//!
//! `Grid2D` 按行优先存储，行号 `j = 0` 为最南一行，列号 `i = 0` 为最西一列，
//! 与左下角原点 `llcorner` 的约定一致。缺测单元以 `None` 表示；
//! 与外部交换原始数组时才转换为哨兵值。

use mg_foundation::error::{MgError, MgResult};
use mg_foundation::nodata;
use mg_geo::{Coords, Point2D};
use serde::{Deserialize, Serialize};

/// 几何比较的相对容差
const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// 统计时的缺测处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodataHandling {
    /// 跳过缺测单元
    #[default]
    Parse,
    /// 原始模式：缺测单元按哨兵值参与统计
    Raw,
}

/// 栅格几何
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// 列数
    pub ncols: usize,
    /// 行数
    pub nrows: usize,
    /// 单元边长 [m]
    pub cellsize: f64,
    /// 左下角位置
    pub llcorner: Coords,
}

impl GridGeometry {
    /// 创建新的栅格几何
    pub fn new(ncols: usize, nrows: usize, cellsize: f64, llcorner: Coords) -> Self {
        Self {
            ncols,
            nrows,
            cellsize,
            llcorner,
        }
    }

    /// 单元总数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.ncols * self.nrows
    }

    /// 二维索引转一维索引
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.ncols + i
    }

    /// 一维索引转二维索引
    #[inline]
    pub fn coords_of(&self, idx: usize) -> (usize, usize) {
        (idx % self.ncols, idx / self.ncols)
    }

    /// 单元中心的投影坐标
    #[inline]
    pub fn cell_center(&self, i: usize, j: usize) -> Point2D {
        Point2D::new(
            self.llcorner.easting + (i as f64 + 0.5) * self.cellsize,
            self.llcorner.northing + (j as f64 + 0.5) * self.cellsize,
        )
    }

    /// 与另一几何是否描述同一地理位置
    pub fn is_same(&self, other: &Self) -> bool {
        let tol = GEOMETRY_TOLERANCE * self.cellsize.abs().max(1.0);
        self.ncols == other.ncols
            && self.nrows == other.nrows
            && (self.cellsize - other.cellsize).abs() < tol
            && (self.llcorner.easting - other.llcorner.easting).abs() < tol
            && (self.llcorner.northing - other.llcorner.northing).abs() < tol
    }

    /// 检查几何一致，不一致时返回错误
    pub fn ensure_same(&self, other: &Self) -> MgResult<()> {
        if self.is_same(other) {
            Ok(())
        } else {
            Err(MgError::geometry_mismatch(format!(
                "{}x{}@{} 与 {}x{}@{} 不一致",
                self.ncols, self.nrows, self.cellsize, other.ncols, other.nrows, other.cellsize
            )))
        }
    }

    /// 子区域几何
    pub fn subset(&self, i0: usize, j0: usize, ncols: usize, nrows: usize) -> MgResult<Self> {
        if ncols == 0 || nrows == 0 {
            return Err(MgError::invalid_input("子区域尺寸必须为正"));
        }
        MgError::check_index("subset column", i0 + ncols - 1, self.ncols)?;
        MgError::check_index("subset row", j0 + nrows - 1, self.nrows)?;

        let mut llcorner = self.llcorner;
        llcorner.easting += i0 as f64 * self.cellsize;
        llcorner.northing += j0 as f64 * self.cellsize;
        llcorner.latitude = None;
        llcorner.longitude = None;
        Ok(Self::new(ncols, nrows, self.cellsize, llcorner))
    }
}

/// 二维场栅格
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    geometry: GridGeometry,
    values: Vec<Option<f64>>,
}

impl Grid2D {
    /// 创建以同一值填充的栅格
    pub fn new(geometry: GridGeometry, fill: Option<f64>) -> Self {
        Self {
            values: vec![fill; geometry.n_cells()],
            geometry,
        }
    }

    /// 创建全部缺测的栅格
    pub fn empty(geometry: GridGeometry) -> Self {
        Self::new(geometry, None)
    }

    /// 从数据创建
    pub fn from_values(geometry: GridGeometry, values: Vec<Option<f64>>) -> MgResult<Self> {
        MgError::check_size("grid values", geometry.n_cells(), values.len())?;
        Ok(Self { geometry, values })
    }

    /// 从带哨兵值的原始数组创建（外部接口）
    pub fn from_raw(geometry: GridGeometry, raw: &[f64]) -> MgResult<Self> {
        MgError::check_size("raw grid", geometry.n_cells(), raw.len())?;
        Ok(Self {
            geometry,
            values: nodata::parse_slice(raw),
        })
    }

    /// 导出为带哨兵值的原始数组（外部接口）
    pub fn to_raw(&self) -> Vec<f64> {
        nodata::export_slice(&self.values)
    }

    /// 几何
    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// 列数
    #[inline]
    pub fn ncols(&self) -> usize {
        self.geometry.ncols
    }

    /// 行数
    #[inline]
    pub fn nrows(&self) -> usize {
        self.geometry.nrows
    }

    /// 单元边长
    #[inline]
    pub fn cellsize(&self) -> f64 {
        self.geometry.cellsize
    }

    /// 单元值
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.geometry.ncols && j < self.geometry.nrows {
            self.values[self.geometry.index(i, j)]
        } else {
            None
        }
    }

    /// 设置单元值，越界时忽略
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: Option<f64>) {
        if i < self.geometry.ncols && j < self.geometry.nrows {
            let idx = self.geometry.index(i, j);
            self.values[idx] = value;
        }
    }

    /// 全部单元值
    #[inline]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// 全部单元值（可变）
    #[inline]
    pub fn values_mut(&mut self) -> &mut [Option<f64>] {
        &mut self.values
    }

    /// 以同一值填充
    pub fn fill(&mut self, value: Option<f64>) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    /// 重置为给定几何的全缺测栅格
    pub fn reset(&mut self, geometry: GridGeometry) {
        self.geometry = geometry;
        self.values.clear();
        self.values.resize(geometry.n_cells(), None);
    }

    /// 与另一栅格是否同一地理位置
    #[inline]
    pub fn is_same_geolocalization(&self, other: &Self) -> bool {
        self.geometry.is_same(&other.geometry)
    }

    /// 逐单元变换，缺测单元保持缺测
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> Option<f64>,
    {
        Self {
            geometry: self.geometry,
            values: self.values.iter().map(|v| v.and_then(&f)).collect(),
        }
    }

    /// 两栅格逐单元组合，任一缺测则结果缺测
    pub fn zip_map<F>(&self, other: &Self, f: F) -> MgResult<Self>
    where
        F: Fn(f64, f64) -> Option<f64>,
    {
        self.geometry.ensure_same(&other.geometry)?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => f(*a, *b),
                _ => None,
            })
            .collect();
        Ok(Self {
            geometry: self.geometry,
            values,
        })
    }

    /// 三栅格逐单元组合
    pub fn zip3_map<F>(&self, b: &Self, c: &Self, f: F) -> MgResult<Self>
    where
        F: Fn(f64, f64, f64) -> Option<f64>,
    {
        self.geometry.ensure_same(&b.geometry)?;
        self.geometry.ensure_same(&c.geometry)?;
        let values = (0..self.values.len())
            .map(|k| match (self.values[k], b.values[k], c.values[k]) {
                (Some(x), Some(y), Some(z)) => f(x, y, z),
                _ => None,
            })
            .collect();
        Ok(Self {
            geometry: self.geometry,
            values,
        })
    }

    /// 提取子区域
    pub fn subset(&self, i0: usize, j0: usize, ncols: usize, nrows: usize) -> MgResult<Self> {
        let geometry = self.geometry.subset(i0, j0, ncols, nrows)?;
        let mut values = Vec::with_capacity(geometry.n_cells());
        for j in j0..j0 + nrows {
            let start = self.geometry.index(i0, j);
            values.extend_from_slice(&self.values[start..start + ncols]);
        }
        Ok(Self { geometry, values })
    }

    // ========================================================================
    // 统计
    // ========================================================================

    fn stat_values(&self, handling: NodataHandling) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(move |v| match (v, handling) {
            (Some(x), _) => Some(*x),
            (None, NodataHandling::Raw) => Some(nodata::NODATA),
            (None, NodataHandling::Parse) => None,
        })
    }

    /// 有效单元数
    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// 最小值
    pub fn min(&self, handling: NodataHandling) -> Option<f64> {
        self.stat_values(handling).reduce(f64::min)
    }

    /// 最大值
    pub fn max(&self, handling: NodataHandling) -> Option<f64> {
        self.stat_values(handling).reduce(f64::max)
    }

    /// 平均值
    pub fn mean(&self, handling: NodataHandling) -> Option<f64> {
        let (sum, n) = self
            .stat_values(handling)
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// 总和（跳过缺测）
    pub fn sum(&self) -> f64 {
        self.values.iter().flatten().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(ncols: usize, nrows: usize) -> GridGeometry {
        GridGeometry::new(ncols, nrows, 100.0, Coords::new(1000.0, 2000.0, 0.0))
    }

    #[test]
    fn test_cell_center_and_index() {
        let g = geometry(4, 3);
        assert_eq!(g.index(1, 2), 9);
        assert_eq!(g.coords_of(9), (1, 2));
        let c = g.cell_center(0, 0);
        assert!((c.x - 1050.0).abs() < 1e-10);
        assert!((c.y - 2050.0).abs() < 1e-10);
    }

    #[test]
    fn test_raw_roundtrip_uses_sentinel() {
        let raw = vec![1.0, -999.0, 3.0, 4.0];
        let grid = Grid2D::from_raw(geometry(2, 2), &raw).unwrap();
        assert_eq!(grid.get(1, 0), None);
        assert_eq!(grid.count(), 3);
        assert_eq!(grid.to_raw(), raw);
    }

    #[test]
    fn test_stats_skip_nodata_unless_raw() {
        let grid =
            Grid2D::from_values(geometry(2, 2), vec![Some(1.0), None, Some(3.0), Some(5.0)]).unwrap();
        assert_eq!(grid.min(NodataHandling::Parse), Some(1.0));
        assert_eq!(grid.mean(NodataHandling::Parse), Some(3.0));
        assert_eq!(grid.min(NodataHandling::Raw), Some(-999.0));
        assert_eq!(grid.max(NodataHandling::Raw), Some(5.0));
    }

    #[test]
    fn test_size_mismatch() {
        assert!(Grid2D::from_values(geometry(2, 2), vec![None; 3]).is_err());
    }

    #[test]
    fn test_subset() {
        let values = (0..12).map(|v| Some(v as f64)).collect();
        let grid = Grid2D::from_values(geometry(4, 3), values).unwrap();
        let sub = grid.subset(1, 1, 2, 2).unwrap();
        assert_eq!(sub.values(), &[Some(5.0), Some(6.0), Some(9.0), Some(10.0)]);
        assert!((sub.geometry().llcorner.easting - 1100.0).abs() < 1e-10);
        assert!(grid.subset(3, 0, 2, 1).is_err());
    }

    #[test]
    fn test_zip_map_requires_same_geometry() {
        let a = Grid2D::new(geometry(2, 2), Some(3.0));
        let b = Grid2D::new(geometry(2, 2), Some(4.0));
        let hyp = a.zip_map(&b, |x, y| Some((x * x + y * y).sqrt())).unwrap();
        assert_eq!(hyp.get(1, 1), Some(5.0));

        let c = Grid2D::new(geometry(3, 2), Some(4.0));
        assert!(matches!(
            a.zip_map(&c, |x, _| Some(x)),
            Err(MgError::GeometryMismatch { .. })
        ));
    }
}
