// crates/mg_grids/src/source.rs

//! 栅格数据源接口
//!
//! 文件、数据库等具体插件在引擎之外实现 [`GridSource`]。
//! 读取不存在的栅格返回 [`MgError::NoData`]，推导层据此判断依赖缺失。

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::{MeteoParam, Timestamp};
use mg_terrain::Grid2D;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 时间窗内可用栅格清单
pub type GridInventory = BTreeMap<Timestamp, BTreeSet<MeteoParam>>;

/// 栅格数据源 trait
pub trait GridSource: Send + Sync {
    /// 读取数字高程模型
    fn read_dem(&self) -> MgResult<Grid2D>;

    /// 读取某参数某时刻的栅格
    fn read_grid(&self, param: MeteoParam, date: Timestamp) -> MgResult<Grid2D>;

    /// 按名称读取栅格（如 `LANDUSE` 或预先计算好的文件）
    fn read_named_grid(&self, name: &str) -> MgResult<Grid2D>;

    /// 列出 `[start, end]` 内可用的栅格
    ///
    /// 返回 `Ok(None)` 表示数据源不支持清单查询。
    fn list_grids(&self, _start: Timestamp, _end: Timestamp) -> MgResult<Option<GridInventory>> {
        Ok(None)
    }

    /// 写出参数栅格
    fn write_grid(&self, param: MeteoParam, date: Timestamp, _grid: &Grid2D) -> MgResult<()> {
        Err(MgError::not_implemented(format!("写出栅格 {param}@{date}")))
    }

    /// 按名称写出栅格
    fn write_named_grid(&self, name: &str, _grid: &Grid2D) -> MgResult<()> {
        Err(MgError::not_implemented(format!("写出栅格 {name}")))
    }
}

/// 内存栅格数据源
///
/// 用于嵌入式调用和测试；记录读取与清单查询次数。
#[derive(Debug, Default)]
pub struct MemoryGridSource {
    dem: RwLock<Option<Grid2D>>,
    grids: RwLock<HashMap<(MeteoParam, Timestamp), Grid2D>>,
    named: RwLock<HashMap<String, Grid2D>>,
    listing: bool,
    read_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryGridSource {
    /// 创建支持清单查询的空数据源
    pub fn new() -> Self {
        Self {
            listing: true,
            ..Self::default()
        }
    }

    /// 创建不支持清单查询的空数据源
    pub fn without_listing() -> Self {
        Self::default()
    }

    /// 设置高程
    pub fn with_dem(self, dem: Grid2D) -> Self {
        *self.dem.write() = Some(dem);
        self
    }

    /// 添加参数栅格
    pub fn insert_grid(&self, param: MeteoParam, date: Timestamp, grid: Grid2D) {
        self.grids.write().insert((param, date), grid);
    }

    /// 添加命名栅格
    pub fn insert_named(&self, name: impl Into<String>, grid: Grid2D) {
        self.named.write().insert(name.into(), grid);
    }

    /// 参数栅格数量
    pub fn len(&self) -> usize {
        self.grids.read().len()
    }

    /// 是否没有参数栅格
    pub fn is_empty(&self) -> bool {
        self.grids.read().is_empty()
    }

    /// `read_grid` 与 `read_named_grid` 调用次数
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::Relaxed)
    }

    /// `list_grids` 调用次数
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }
}

impl GridSource for MemoryGridSource {
    fn read_dem(&self) -> MgResult<Grid2D> {
        self.dem
            .read()
            .clone()
            .ok_or_else(|| MgError::no_data("DEM"))
    }

    fn read_grid(&self, param: MeteoParam, date: Timestamp) -> MgResult<Grid2D> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.grids
            .read()
            .get(&(param, date))
            .cloned()
            .ok_or_else(|| MgError::no_data(format!("{param}@{date}")))
    }

    fn read_named_grid(&self, name: &str) -> MgResult<Grid2D> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.named
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| MgError::no_data(name.to_string()))
    }

    fn list_grids(&self, start: Timestamp, end: Timestamp) -> MgResult<Option<GridInventory>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        if !self.listing {
            return Ok(None);
        }
        let mut inventory = GridInventory::new();
        for (param, date) in self.grids.read().keys() {
            if *date >= start && *date <= end {
                inventory.entry(*date).or_default().insert(*param);
            }
        }
        Ok(Some(inventory))
    }

    fn write_grid(&self, param: MeteoParam, date: Timestamp, grid: &Grid2D) -> MgResult<()> {
        self.insert_grid(param, date, grid.clone());
        Ok(())
    }

    fn write_named_grid(&self, name: &str, grid: &Grid2D) -> MgResult<()> {
        self.insert_named(name, grid.clone());
        Ok(())
    }
}
