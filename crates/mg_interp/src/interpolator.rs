// crates/mg_interp/src/interpolator.rs

//! 插值调度器
//!
//! 对一个参数与时刻：
//!
//! 1. 命中缓存则直接返回；
//! 2. 读取该时刻的测站观测；
//! 3. 为每个候选算法创建实例并评分，选出评分严格最高者（同分取先配置者）；
//! 4. 计算，按需截断到物理合理范围，写入缓存。
//!
//! 所选算法失败时默认直接报错；`FailurePolicy::FallbackToNextBest`
//! 下按评分依次尝试其余评分为正的候选。

use chrono::Duration;
use mg_config::{EngineConfig, FailurePolicy};
use mg_foundation::error::{MgError, MgResult};
use mg_grids::{GridManager, GridSource};
use mg_meteo::{MeteoData, MeteoParam, ObservationSource, Timestamp};
use mg_terrain::{Grid2D, TerrainModel};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::algorithms::{AlgorithmContext, FieldProvider, InterpolationAlgorithm};
use crate::registry::{AlgorithmRegistry, AlgorithmSpec};

fn hours(key: &str, h: f64) -> MgResult<Duration> {
    let seconds = (h * 3600.0).round();
    if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
        return Err(MgError::config(format!("{key} 超出范围: {h} h")));
    }
    Duration::try_seconds(seconds as i64)
        .ok_or_else(|| MgError::config(format!("{key} 超出范围: {h} h")))
}

/// 插值调度器
pub struct Interpolator {
    config: EngineConfig,
    registry: AlgorithmRegistry,
    candidates: BTreeMap<MeteoParam, Vec<AlgorithmSpec>>,
    observations: Arc<dyn ObservationSource>,
    grids: Arc<GridManager>,
    info: Mutex<String>,
}

impl std::fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpolator")
            .field("candidates", &self.candidates)
            .field("failure_policy", &self.config.failure_policy)
            .field("grids", &self.grids)
            .finish()
    }
}

impl Interpolator {
    /// 用全部已知算法创建调度器
    ///
    /// 配置中的算法名与参数在此时全部校验。
    pub fn new(
        config: EngineConfig,
        observations: Arc<dyn ObservationSource>,
        grid_source: Arc<dyn GridSource>,
    ) -> MgResult<Self> {
        Self::with_registry(config, AlgorithmRegistry::new(), observations, grid_source)
    }

    /// 使用指定注册表创建调度器
    pub fn with_registry(
        config: EngineConfig,
        registry: AlgorithmRegistry,
        observations: Arc<dyn ObservationSource>,
        grid_source: Arc<dyn GridSource>,
    ) -> MgResult<Self> {
        config.validate()?;

        let mut candidates = BTreeMap::new();
        for (&param, entries) in &config.interpolation {
            let specs = entries
                .iter()
                .map(|e| registry.resolve(&e.name, e.args.as_slice()))
                .collect::<MgResult<Vec<_>>>()?;
            log::debug!(
                "{param} 候选算法: {}",
                specs.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
            );
            candidates.insert(param, specs);
        }

        let grids = GridManager::new(grid_source, config.cache.max_grids).with_window(
            hours("grids.window_before_hours", config.grids.window_before_hours)?,
            hours("grids.window_after_hours", config.grids.window_after_hours)?,
        );

        Ok(Self {
            config,
            registry,
            candidates,
            observations,
            grids: Arc::new(grids),
            info: Mutex::new(String::new()),
        })
    }

    /// 配置
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 注册表
    #[inline]
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// 栅格管理器
    #[inline]
    pub fn grids(&self) -> &Arc<GridManager> {
        &self.grids
    }

    /// 某参数的候选算法
    pub fn candidates(&self, param: MeteoParam) -> &[AlgorithmSpec] {
        self.candidates.get(&param).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 读取数据源中的 DEM 并设为当前地形
    pub fn read_dem(&self) -> MgResult<Arc<TerrainModel>> {
        self.grids.read_dem()
    }

    /// 最近一次计算的诊断信息
    pub fn info(&self) -> String {
        self.info.lock().clone()
    }

    /// 各候选算法在该参数、时刻的评分，按配置顺序
    pub fn ratings(&self, date: Timestamp, param: MeteoParam) -> MgResult<Vec<(&'static str, f64)>> {
        let observations = self.observations.observations(date)?;
        let ctx = self.context(date, &observations);
        Ok(self
            .rated(param, &ctx)?
            .into_iter()
            .map(|(algo, rating)| (algo.name(), rating))
            .collect())
    }

    /// 在 `dem` 上计算参数场并写入 `grid`
    pub fn calculate(
        &self,
        date: Timestamp,
        param: MeteoParam,
        dem: &TerrainModel,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        if let Some(cached) = self.grids.get_matching(param, date, dem.geometry()) {
            log::debug!("{param}@{} 命中缓存", date.to_rfc3339());
            *grid = (*cached).clone();
            *self.info.lock() = format!("{param}: 缓存");
            return Ok(());
        }

        let observations = self.observations.observations(date)?;
        let ctx = self.context(date, &observations);
        let mut rated = self.rated(param, &ctx)?;
        // 稳定排序：同分保持配置顺序
        rated.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (best, best_rating) = match rated.first() {
            Some((algo, rating)) => (algo.name(), *rating),
            None => return Err(MgError::config(format!("参数 {param} 没有配置插值算法"))),
        };
        if best_rating <= 0.0 {
            return Err(MgError::interpolation_failed(
                best,
                format!("参数 {param} 没有适用的算法（{} 个测站）", observations.len()),
            ));
        }

        let attempts = match self.config.failure_policy {
            FailurePolicy::FailLoudly => 1,
            FailurePolicy::FallbackToNextBest => rated.len(),
        };

        let mut last_error = None;
        for (mut algo, rating) in rated.into_iter().take(attempts) {
            if rating <= 0.0 {
                break;
            }
            if last_error.is_none() {
                log::info!("{param}@{}: 选用 {} (评分 {rating:.3})", date.to_rfc3339(), algo.name());
            } else {
                log::warn!("{param}: 回退到 {} (评分 {rating:.3})", algo.name());
            }

            match algo.calculate(dem, &ctx, grid) {
                Ok(()) => {
                    self.finish(param, grid);
                    if grid.geometry().is_same(dem.geometry()) {
                        self.grids.push_adopting(param, date, grid.clone());
                    } else {
                        log::warn!("{param}@{}: 结果几何与地形不一致，不写入缓存", date.to_rfc3339());
                    }
                    *self.info.lock() = format!("{param}: {} - {}", algo.name(), algo.info());
                    return Ok(());
                }
                Err(e) => {
                    if self.config.failure_policy == FailurePolicy::FallbackToNextBest {
                        log::warn!("{param}: {} 计算失败: {e}", algo.name());
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MgError::internal("没有尝试任何算法")))
    }

    /// 计算参数场并返回新栅格
    pub fn interpolate(&self, date: Timestamp, param: MeteoParam, dem: &TerrainModel) -> MgResult<Grid2D> {
        let mut grid = Grid2D::empty(*dem.geometry());
        self.calculate(date, param, dem, &mut grid)?;
        Ok(grid)
    }

    fn context<'a>(&'a self, date: Timestamp, observations: &'a [MeteoData]) -> AlgorithmContext<'a> {
        AlgorithmContext::new(date, observations)
            .with_grids(&self.grids)
            .with_fields(self)
    }

    fn rated(
        &self,
        param: MeteoParam,
        ctx: &AlgorithmContext<'_>,
    ) -> MgResult<Vec<(Box<dyn InterpolationAlgorithm>, f64)>> {
        let specs = self
            .candidates
            .get(&param)
            .ok_or_else(|| MgError::config(format!("参数 {param} 没有配置插值算法")))?;

        Ok(specs
            .iter()
            .map(|spec| {
                let mut algo = spec.instantiate();
                algo.initialize(param, ctx);
                let rating = algo.quality_rating();
                log::debug!("{param}: {spec} 评分 {rating:.6}");
                (algo, rating)
            })
            .collect())
    }

    fn finish(&self, param: MeteoParam, grid: &mut Grid2D) {
        if !self.config.range_checks {
            return;
        }
        if let Some((lo, hi)) = param.plausible_range() {
            let mut clamped = 0usize;
            for v in grid.values_mut().iter_mut().flatten() {
                let c = v.clamp(lo, hi);
                if c != *v {
                    clamped += 1;
                    *v = c;
                }
            }
            if clamped > 0 {
                log::debug!("{param}: {clamped} 个单元被截断到 [{lo}, {hi}]");
            }
        }
    }
}

impl FieldProvider for Interpolator {
    fn field(&self, param: MeteoParam, date: Timestamp, dem: &TerrainModel) -> MgResult<Arc<Grid2D>> {
        if let Some(cached) = self.grids.get_matching(param, date, dem.geometry()) {
            return Ok(cached);
        }
        let grid = self.interpolate(date, param, dem)?;
        Ok(self
            .grids
            .get_matching(param, date, dem.geometry())
            .unwrap_or_else(|| Arc::new(grid)))
    }
}
