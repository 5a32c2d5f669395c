// crates/mg_interp/src/algorithms/mod.rs

//! 空间插值算法
//!
//! 每个算法实例只服务于一次"参数 + 时刻"的计算：
//!
//! 1. [`InterpolationAlgorithm::initialize`] 收集该参数的有效测站值；
//! 2. [`InterpolationAlgorithm::quality_rating`] 给出 [0, 1] 的自评分，
//!    调度器据此在候选算法中选择；
//! 3. [`InterpolationAlgorithm::calculate`] 填充栅格。
//!
//! 所有算法都保持 DEM 缺测单元为缺测。
//!
//! | 名称 | 说明 |
//! |------|------|
//! | `NONE` | 不填充 |
//! | `AVG` | 测站平均值 |
//! | `STD_PRESS` | 标准大气气压 |
//! | `AVG_LAPSE` | 海拔回归 + 平均残差 |
//! | `IDW` | 反距离加权 |
//! | `IDW_LAPSE` | 海拔回归 + 残差 IDW |
//! | `LIDW_LAPSE` | 逐单元最近 N 站的局部回归 + IDW |
//! | `RH` | 经露点插值相对湿度 |
//! | `WIND_CURV` | 坡度/曲率修正的风场 |
//! | `PSUM_SNOW` | 地形再分配的降雪 |
//! | `USER` | 读取预先计算的栅格 |
//! | `ODKRIG` | 普通克里金（未实现） |

pub mod args;
pub mod constant;
pub mod humidity;
pub mod idw;
pub mod kriging;
pub mod lapse;
pub mod snow;
pub mod std_press;
pub mod user;
pub mod wind;

use mg_foundation::error::MgResult;
use mg_geo::{Coords, Point2D};
use mg_grids::GridManager;
use mg_meteo::{MeteoData, MeteoParam, Timestamp};
use mg_terrain::{Grid2D, TerrainModel};
use rayon::prelude::*;
use std::sync::Arc;

pub use args::AlgorithmArgs;

/// 单个有效测站值
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// 观测值
    pub value: f64,
    /// 测站位置
    pub position: Coords,
}

impl Measurement {
    /// 创建测站值
    pub fn new(value: f64, position: Coords) -> Self {
        Self { value, position }
    }

    /// 平面位置
    #[inline]
    pub fn point(&self) -> Point2D {
        self.position.point()
    }

    /// 海拔
    #[inline]
    pub fn altitude(&self) -> f64 {
        self.position.altitude
    }
}

/// 收集某参数的有效测站值，跳过缺测
pub fn gather(param: MeteoParam, observations: &[MeteoData]) -> Vec<Measurement> {
    observations
        .iter()
        .filter_map(|md| md.get(param).map(|v| Measurement::new(v, md.station.position)))
        .collect()
}

/// 按参数提供插值场（供依赖其它参数的算法使用）
pub trait FieldProvider: Send + Sync {
    /// 在 `dem` 上得到参数场
    fn field(&self, param: MeteoParam, date: Timestamp, dem: &TerrainModel) -> MgResult<Arc<Grid2D>>;
}

/// 算法运行上下文
#[derive(Clone, Copy)]
pub struct AlgorithmContext<'a> {
    /// 时刻
    pub date: Timestamp,
    /// 该时刻全部测站观测
    pub observations: &'a [MeteoData],
    /// 栅格管理器（`USER` 读取栅格时使用）
    pub grids: Option<&'a GridManager>,
    /// 其它参数场的提供者
    pub fields: Option<&'a dyn FieldProvider>,
}

impl<'a> AlgorithmContext<'a> {
    /// 只有观测的上下文
    pub fn new(date: Timestamp, observations: &'a [MeteoData]) -> Self {
        Self {
            date,
            observations,
            grids: None,
            fields: None,
        }
    }

    /// 附加栅格管理器
    pub fn with_grids(mut self, grids: &'a GridManager) -> Self {
        self.grids = Some(grids);
        self
    }

    /// 附加参数场提供者
    pub fn with_fields(mut self, fields: &'a dyn FieldProvider) -> Self {
        self.fields = Some(fields);
        self
    }
}

impl std::fmt::Debug for AlgorithmContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmContext")
            .field("date", &self.date)
            .field("observations", &self.observations.len())
            .field("grids", &self.grids.is_some())
            .field("fields", &self.fields.is_some())
            .finish()
    }
}

/// 插值算法 trait
pub trait InterpolationAlgorithm: Send {
    /// 算法名
    fn name(&self) -> &'static str;

    /// 收集参数的有效观测
    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>);

    /// 自评分 [0, 1]，不适用时为 0
    fn quality_rating(&self) -> f64;

    /// 在 `dem` 的几何上填充 `grid`
    fn calculate(
        &mut self,
        dem: &TerrainModel,
        ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()>;

    /// 最近一次计算的诊断信息
    fn info(&self) -> String;
}

/// 逐单元填充栅格
///
/// `grid` 被重置为 DEM 的几何；DEM 缺测的单元保持缺测，其余单元取
/// `f(i, j, altitude)`。按行并行。
pub fn fill_cells<F>(dem: &TerrainModel, grid: &mut Grid2D, f: F)
where
    F: Fn(usize, usize, f64) -> Option<f64> + Sync,
{
    let geometry = *dem.geometry();
    grid.reset(geometry);
    if geometry.n_cells() == 0 {
        return;
    }

    grid.values_mut()
        .par_chunks_mut(geometry.ncols)
        .enumerate()
        .for_each(|(j, row)| {
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = dem.altitude(i, j).and_then(|z| f(i, j, z));
            }
        });
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;
    use mg_meteo::StationData;
    use mg_terrain::GridGeometry;

    pub fn date() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap()
    }

    /// 测站 (x, y, z) 上的单参数观测
    pub fn observations(param: MeteoParam, stations: &[(f64, f64, f64, f64)]) -> Vec<MeteoData> {
        stations
            .iter()
            .enumerate()
            .map(|(k, &(x, y, z, v))| {
                let st = StationData::new(format!("S{k}"), Coords::new(x, y, z));
                MeteoData::new(date(), st).with(param, v)
            })
            .collect()
    }

    /// 常数高程的 DEM
    pub fn flat_dem(ncols: usize, nrows: usize, z: f64) -> TerrainModel {
        let geometry = GridGeometry::new(ncols, nrows, 100.0, Coords::default());
        TerrainModel::new(Grid2D::new(geometry, Some(z)))
    }

    /// 按单元高程函数构造 DEM
    pub fn dem_from<F: Fn(usize, usize) -> Option<f64>>(ncols: usize, nrows: usize, f: F) -> TerrainModel {
        let geometry = GridGeometry::new(ncols, nrows, 100.0, Coords::default());
        let mut grid = Grid2D::empty(geometry);
        for j in 0..nrows {
            for i in 0..ncols {
                grid.set(i, j, f(i, j));
            }
        }
        TerrainModel::new(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_gather_skips_missing() {
        let mut obs = observations(MeteoParam::Ta, &[(0.0, 0.0, 1000.0, 270.0), (1.0, 0.0, 1100.0, 269.0)]);
        obs[1].set(MeteoParam::Ta, None);
        let m = gather(MeteoParam::Ta, &obs);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].altitude(), 1000.0);
        assert!(gather(MeteoParam::Rh, &obs).is_empty());
    }

    #[test]
    fn test_fill_cells_respects_dem_mask() {
        let dem = dem_from(3, 2, |i, _| (i != 1).then_some(1000.0));
        let mut grid = Grid2D::empty(*flat_dem(1, 1, 0.0).geometry());
        fill_cells(&dem, &mut grid, |i, j, z| Some(z + (i + 10 * j) as f64));
        assert_eq!(grid.geometry(), dem.geometry());
        assert_eq!(grid.get(0, 1), Some(1010.0));
        assert_eq!(grid.get(1, 0), None);
        assert_eq!(grid.get(2, 0), Some(1002.0));
    }
}
