// crates/mg_grids/src/cache.rs

//! 栅格缓存
//!
//! 有界 FIFO 缓存：超出容量时淘汰最早插入的条目。缓存的栅格以
//! `Arc<Grid2D>` 共享，取出后无需持锁即可读取。
//!
//! 设置了当前地形几何后，几何不一致的栅格既不能写入，也不会被返回。
//! 切换几何与写入可以在同一次加锁内完成（[`GridCache::push_adopting`]），
//! 多个线程交替使用不同 DEM 时不会互相使写入失败。

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::{MeteoParam, Timestamp};
use mg_terrain::{Grid2D, GridGeometry};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// 参数与时刻
    Param(MeteoParam, Timestamp),
    /// 命名栅格，如 `DEM`
    Named(String),
}

impl CacheKey {
    /// 参数键
    pub fn param(param: MeteoParam, date: Timestamp) -> Self {
        Self::Param(param, date)
    }

    /// 命名键
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(param, date) => write!(f, "{param}@{}", date.to_rfc3339()),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Arc<Grid2D>>,
    order: VecDeque<CacheKey>,
    geometry: Option<GridGeometry>,
}

impl CacheState {
    fn remove(&mut self, key: &CacheKey) -> Option<Arc<Grid2D>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    fn insert(&mut self, key: CacheKey, grid: Arc<Grid2D>, max_grids: usize) {
        self.remove(&key);
        self.order.push_back(key.clone());
        self.entries.insert(key, grid);

        while self.entries.len() > max_grids {
            match self.order.pop_front() {
                Some(oldest) => {
                    log::debug!("缓存已满，淘汰 {oldest}");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn adopt_geometry(&mut self, geometry: GridGeometry) {
        if self.geometry.is_some_and(|g| g.is_same(&geometry)) {
            return;
        }
        self.geometry = Some(geometry);

        let stale: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, grid)| !geometry.is_same(grid.geometry()))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            log::warn!("地形几何已变化，移除缓存 {key}");
            self.remove(&key);
        }
    }

    fn check_geometry(&self, key: &CacheKey, grid: &Grid2D) -> MgResult<()> {
        match &self.geometry {
            Some(geometry) if !geometry.is_same(grid.geometry()) => Err(
                MgError::geometry_mismatch(format!("{key} 与当前地形几何不一致")),
            ),
            _ => Ok(()),
        }
    }
}

/// 有界栅格缓存
#[derive(Debug)]
pub struct GridCache {
    max_grids: usize,
    state: Mutex<CacheState>,
}

impl GridCache {
    /// 创建缓存，容量至少为 1
    pub fn new(max_grids: usize) -> Self {
        Self {
            max_grids: max_grids.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// 容量
    #[inline]
    pub fn max_grids(&self) -> usize {
        self.max_grids
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// 是否包含键
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// 当前地形几何
    pub fn geometry(&self) -> Option<GridGeometry> {
        self.state.lock().geometry
    }

    /// 设置当前地形几何，并移除几何不一致的条目
    pub fn set_geometry(&self, geometry: Option<GridGeometry>) {
        let mut state = self.state.lock();
        match geometry {
            Some(geometry) => state.adopt_geometry(geometry),
            None => state.geometry = None,
        }
    }

    /// 查询缓存
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Grid2D>> {
        let mut state = self.state.lock();
        let grid = state.entries.get(key).cloned()?;
        if state.check_geometry(key, &grid).is_err() {
            log::warn!("缓存 {key} 的几何与当前地形不一致，已移除");
            state.remove(key);
            return None;
        }
        Some(grid)
    }

    /// 查询与给定几何一致的条目
    ///
    /// 不改变缓存的当前几何，也不移除不一致的条目。
    pub fn get_matching(&self, key: &CacheKey, geometry: &GridGeometry) -> Option<Arc<Grid2D>> {
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .filter(|grid| geometry.is_same(grid.geometry()))
            .cloned()
    }

    /// 以栅格自身的几何为当前几何写入
    ///
    /// 几何切换（移除不一致的条目）与写入在同一次加锁内完成。
    pub fn push_adopting(&self, key: CacheKey, grid: Arc<Grid2D>) -> Arc<Grid2D> {
        let mut state = self.state.lock();
        state.adopt_geometry(*grid.geometry());
        state.insert(key, Arc::clone(&grid), self.max_grids);
        grid
    }

    /// 写入或覆盖条目
    pub fn push(&self, key: CacheKey, grid: Grid2D) -> MgResult<Arc<Grid2D>> {
        self.push_shared(key, Arc::new(grid))
    }

    /// 写入共享栅格
    pub fn push_shared(&self, key: CacheKey, grid: Arc<Grid2D>) -> MgResult<Arc<Grid2D>> {
        let mut state = self.state.lock();
        state.check_geometry(&key, &grid)?;
        state.insert(key, Arc::clone(&grid), self.max_grids);
        Ok(grid)
    }

    /// 查询缓存，未命中时调用 `load` 并写入
    ///
    /// 查询与写入在同一次加锁内完成。`load` 执行期间持有缓存锁，
    /// 因此不得再访问同一缓存。加载结果与当前几何不一致时照常返回，
    /// 但不写入缓存。
    pub fn get_or_try_insert_with<F>(&self, key: CacheKey, load: F) -> MgResult<Arc<Grid2D>>
    where
        F: FnOnce() -> MgResult<Grid2D>,
    {
        let mut state = self.state.lock();
        if let Some(grid) = state.entries.get(&key).cloned() {
            if state.check_geometry(&key, &grid).is_ok() {
                return Ok(grid);
            }
            state.remove(&key);
        }

        let grid = Arc::new(load()?);
        match state.check_geometry(&key, &grid) {
            Ok(()) => state.insert(key, Arc::clone(&grid), self.max_grids),
            Err(e) => log::debug!("不缓存 {key}: {e}"),
        }
        Ok(grid)
    }

    /// 移除条目
    pub fn remove(&self, key: &CacheKey) -> Option<Arc<Grid2D>> {
        self.state.lock().remove(key)
    }

    /// 清空缓存
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }
}
