// crates/mg_grids/src/manager.rs

//! 栅格管理器
//!
//! 把数据源、缓存和推导表组合成统一的栅格获取入口：
//!
//! 1. 先查缓存；
//! 2. 再按可用清单（或清单不可用时直接）从数据源读取；
//! 3. 最后按推导表由相关参数递归计算，中间结果一并缓存。
//!
//! 依赖缺失只是让某条规则不可用，全部路径都失败时才返回 `NoData`。

use chrono::Duration;
use mg_foundation::error::{MgError, MgResult};
use mg_meteo::{MeteoParam, Timestamp};
use mg_terrain::{Grid2D, GridGeometry, TerrainModel};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::{CacheKey, GridCache};
use crate::derivation::rules_for;
use crate::source::{GridInventory, GridSource};

/// 高程在缓存中的键名
pub const DEM_KEY: &str = "DEM";

#[derive(Debug)]
enum Inventory {
    /// 尚未查询
    Unknown,
    /// 数据源不支持清单
    Unsupported,
    /// 已查询的时间窗
    Window {
        start: Timestamp,
        end: Timestamp,
        grids: GridInventory,
    },
}

/// 栅格管理器
pub struct GridManager {
    source: Arc<dyn GridSource>,
    cache: GridCache,
    before: Duration,
    after: Duration,
    inventory: Mutex<Inventory>,
    dem: RwLock<Option<Arc<TerrainModel>>>,
}

impl std::fmt::Debug for GridManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridManager")
            .field("cache", &self.cache)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

impl GridManager {
    /// 创建管理器，默认清单时间窗为前后各 48 小时
    pub fn new(source: Arc<dyn GridSource>, max_grids: usize) -> Self {
        Self {
            source,
            cache: GridCache::new(max_grids),
            before: Duration::hours(48),
            after: Duration::hours(48),
            inventory: Mutex::new(Inventory::Unknown),
            dem: RwLock::new(None),
        }
    }

    /// 设置清单时间窗
    pub fn with_window(mut self, before: Duration, after: Duration) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    /// 缓存
    #[inline]
    pub fn cache(&self) -> &GridCache {
        &self.cache
    }

    /// 数据源
    #[inline]
    pub fn source(&self) -> &Arc<dyn GridSource> {
        &self.source
    }

    // ========================================================================
    // 地形
    // ========================================================================

    /// 读取并缓存地形模型
    pub fn read_dem(&self) -> MgResult<Arc<TerrainModel>> {
        if let Some(dem) = self.dem.read().as_ref() {
            return Ok(Arc::clone(dem));
        }

        let elevation = self.source.read_dem()?;
        let dem = Arc::new(TerrainModel::new(elevation));
        log::info!(
            "已读取 DEM: {}x{} 单元, 边长 {} m",
            dem.geometry().ncols,
            dem.geometry().nrows,
            dem.geometry().cellsize
        );
        self.set_dem(Arc::clone(&dem))?;
        Ok(dem)
    }

    /// 设置当前地形模型
    ///
    /// 缓存中与新几何不一致的栅格会被移除。
    pub fn set_dem(&self, dem: Arc<TerrainModel>) -> MgResult<()> {
        {
            let current = self.dem.read();
            if let Some(current) = current.as_ref() {
                if Arc::ptr_eq(current, &dem) {
                    return Ok(());
                }
            }
        }
        self.cache.set_geometry(Some(*dem.geometry()));
        self.cache
            .push(CacheKey::named(DEM_KEY), dem.elevation().clone())?;
        *self.dem.write() = Some(dem);
        Ok(())
    }

    /// 当前地形模型
    pub fn dem(&self) -> Option<Arc<TerrainModel>> {
        self.dem.read().clone()
    }

    // ========================================================================
    // 读取
    // ========================================================================

    /// 按名称读取栅格（经缓存）
    pub fn read_named_grid(&self, name: &str) -> MgResult<Arc<Grid2D>> {
        self.cache
            .get_or_try_insert_with(CacheKey::named(name), || self.source.read_named_grid(name))
    }

    /// 缓存中已有的参数栅格
    pub fn get(&self, param: MeteoParam, date: Timestamp) -> Option<Arc<Grid2D>> {
        self.cache.get(&CacheKey::param(param, date))
    }

    /// 写入缓存
    pub fn push(&self, param: MeteoParam, date: Timestamp, grid: Grid2D) -> MgResult<Arc<Grid2D>> {
        self.cache.push(CacheKey::param(param, date), grid)
    }

    /// 缓存中与 `geometry` 一致的参数栅格
    pub fn get_matching(&self, param: MeteoParam, date: Timestamp, geometry: &GridGeometry) -> Option<Arc<Grid2D>> {
        self.cache.get_matching(&CacheKey::param(param, date), geometry)
    }

    /// 写入缓存，并把缓存几何切换为该栅格的几何
    pub fn push_adopting(&self, param: MeteoParam, date: Timestamp, grid: Grid2D) -> Arc<Grid2D> {
        self.cache.push_adopting(CacheKey::param(param, date), Arc::new(grid))
    }

    /// 写出到数据源
    pub fn write_grid(&self, param: MeteoParam, date: Timestamp, grid: &Grid2D) -> MgResult<()> {
        self.source.write_grid(param, date, grid)
    }

    /// 获取参数栅格：直接读取或由相关参数推导
    pub fn resolve(&self, param: MeteoParam, date: Timestamp) -> MgResult<Arc<Grid2D>> {
        let mut visiting = BTreeSet::new();
        self.resolve_inner(param, date, &mut visiting)?
            .ok_or_else(|| MgError::no_data(format!("{param}@{}", date.to_rfc3339())))
    }

    fn resolve_inner(
        &self,
        param: MeteoParam,
        date: Timestamp,
        visiting: &mut BTreeSet<MeteoParam>,
    ) -> MgResult<Option<Arc<Grid2D>>> {
        if !visiting.insert(param) {
            return Ok(None);
        }
        let result = self.resolve_unvisited(param, date, visiting);
        visiting.remove(&param);
        result
    }

    fn resolve_unvisited(
        &self,
        param: MeteoParam,
        date: Timestamp,
        visiting: &mut BTreeSet<MeteoParam>,
    ) -> MgResult<Option<Arc<Grid2D>>> {
        if let Some(grid) = self.get(param, date) {
            return Ok(Some(grid));
        }
        if let Some(grid) = self.read_direct(param, date)? {
            return Ok(Some(grid));
        }

        'rules: for rule in rules_for(param) {
            let elevation = if rule.needs_elevation {
                match self.dem() {
                    Some(dem) => Some(dem),
                    None => continue,
                }
            } else {
                None
            };

            let mut inputs = Vec::with_capacity(rule.inputs.len());
            for &input in rule.inputs {
                match self.resolve_inner(input, date, visiting)? {
                    Some(grid) => inputs.push(grid),
                    None => continue 'rules,
                }
            }

            let refs: Vec<&Grid2D> = inputs.iter().map(Arc::as_ref).collect();
            let grid = (rule.compute)(&refs, elevation.as_ref().map(|d| d.elevation()))?;
            log::info!("由 {:?} 推导 {param}@{}", rule.inputs, date.to_rfc3339());
            return self.push(param, date, grid).map(Some);
        }

        Ok(None)
    }

    fn read_direct(&self, param: MeteoParam, date: Timestamp) -> MgResult<Option<Arc<Grid2D>>> {
        if self.listed(param, date) == Some(false) {
            return Ok(None);
        }

        match self.source.read_grid(param, date) {
            Ok(grid) => match self.push(param, date, grid) {
                Ok(grid) => Ok(Some(grid)),
                Err(err @ MgError::GeometryMismatch { .. }) => {
                    log::warn!("忽略几何不一致的栅格: {err}");
                    Ok(None)
                }
                Err(err) => Err(err),
            },
            Err(err) if err.is_unavailable() => Ok(None),
            Err(err) => {
                log::warn!("读取 {param}@{} 失败: {err}", date.to_rfc3339());
                Ok(None)
            }
        }
    }

    /// 按清单判断栅格是否存在；`None` 表示清单不可用
    fn listed(&self, param: MeteoParam, date: Timestamp) -> Option<bool> {
        let mut inventory = self.inventory.lock();

        if let Inventory::Window { start, end, grids } = &*inventory {
            if date >= *start && date <= *end {
                return Some(grids.get(&date).map_or(false, |set| set.contains(&param)));
            }
        }
        if matches!(*inventory, Inventory::Unsupported) {
            return None;
        }

        let (start, end) = (date - self.before, date + self.after);
        match self.source.list_grids(start, end) {
            Ok(Some(grids)) => {
                log::debug!(
                    "栅格清单 [{}, {}]: {} 个时刻",
                    start.to_rfc3339(),
                    end.to_rfc3339(),
                    grids.len()
                );
                let found = grids.get(&date).map_or(false, |set| set.contains(&param));
                *inventory = Inventory::Window { start, end, grids };
                Some(found)
            }
            Ok(None) => {
                log::debug!("数据源不支持栅格清单，改为直接读取");
                *inventory = Inventory::Unsupported;
                None
            }
            Err(err) => {
                log::warn!("栅格清单查询失败，改为直接读取: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryGridSource;
    use chrono::TimeZone;
    use mg_geo::Coords;
    use mg_terrain::GridGeometry;

    fn geometry() -> GridGeometry {
        GridGeometry::new(3, 2, 100.0, Coords::default())
    }

    fn date() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_direct_read_is_cached() {
        let source = Arc::new(MemoryGridSource::new());
        source.insert_grid(MeteoParam::Ta, date(), Grid2D::new(geometry(), Some(265.0)));
        let manager = GridManager::new(source.clone(), 8);

        let a = manager.resolve(MeteoParam::Ta, date()).unwrap();
        let b = manager.resolve(MeteoParam::Ta, date()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.read_calls(), 1);
    }

    #[test]
    fn test_missing_everything_is_no_data() {
        let manager = GridManager::new(Arc::new(MemoryGridSource::new()), 8);
        let err = manager.resolve(MeteoParam::Rh, date()).unwrap_err();
        assert!(matches!(err, MgError::NoData { .. }));
    }

    #[test]
    fn test_listing_queried_once_per_window() {
        let source = Arc::new(MemoryGridSource::new());
        let manager = GridManager::new(source.clone(), 8);
        for h in 0..5 {
            let d = date() + Duration::hours(h);
            assert!(manager.resolve(MeteoParam::Hs, d).is_err());
        }
        assert_eq!(source.list_calls(), 1);
        assert_eq!(source.read_calls(), 0);
    }

    #[test]
    fn test_unsupported_listing_falls_back_to_reads() {
        let source = Arc::new(MemoryGridSource::without_listing());
        source.insert_grid(MeteoParam::P, date(), Grid2D::new(geometry(), Some(8.0e4)));
        let manager = GridManager::new(source.clone(), 8);

        assert!(manager.resolve(MeteoParam::P, date()).is_ok());
        assert!(manager.resolve(MeteoParam::P, date() + Duration::hours(1)).is_err());
        assert_eq!(source.list_calls(), 1);
        assert_eq!(source.read_calls(), 2);
    }

    #[test]
    fn test_read_dem_sets_cache_geometry() {
        let source = Arc::new(
            MemoryGridSource::new().with_dem(Grid2D::new(geometry(), Some(1200.0))),
        );
        let manager = GridManager::new(source, 8);
        let dem = manager.read_dem().unwrap();
        assert_eq!(dem.stats().mean_altitude, Some(1200.0));
        assert_eq!(manager.cache().geometry(), Some(geometry()));
        assert!(manager.cache().contains(&CacheKey::named(DEM_KEY)));
        assert!(Arc::ptr_eq(&dem, &manager.read_dem().unwrap()));
    }
}
