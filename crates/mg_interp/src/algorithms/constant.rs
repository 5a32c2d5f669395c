// crates/mg_interp/src/algorithms/constant.rs

//! 常数场算法：`AVG` 与 `NONE`

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};

use super::{fill_cells, gather, AlgorithmContext, InterpolationAlgorithm};
use crate::numerics::stats;

/// `NONE` 的评分：大于零，但低于任何适用的算法
pub const NONE_RATING: f64 = 1e-6;

/// 测站平均值
#[derive(Debug, Clone, Default)]
pub struct Average {
    values: Vec<f64>,
    info: String,
}

impl Average {
    /// 算法名
    pub const NAME: &'static str = "AVG";

    /// 创建算法实例
    pub fn new() -> Self {
        Self::default()
    }
}

impl InterpolationAlgorithm for Average {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.values = gather(param, ctx.observations)
            .into_iter()
            .map(|m| m.value)
            .collect();
    }

    fn quality_rating(&self) -> f64 {
        match self.values.len() {
            0 => 0.0,
            1 => 0.8,
            _ => 0.2,
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        let mean = stats::mean(&self.values)
            .ok_or_else(|| MgError::interpolation_failed(Self::NAME, "没有有效测站数据"))?;
        fill_cells(dem, grid, |_, _, _| Some(mean));
        self.info = format!("{} 站, 平均值 {:.3}", self.values.len(), mean);
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}

/// 不填充：整个栅格置为缺测
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneAlgorithm;

impl NoneAlgorithm {
    /// 算法名
    pub const NAME: &'static str = "NONE";
}

impl InterpolationAlgorithm for NoneAlgorithm {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, _param: MeteoParam, _ctx: &AlgorithmContext<'_>) {}

    fn quality_rating(&self) -> f64 {
        NONE_RATING
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        grid.reset(*dem.geometry());
        Ok(())
    }

    fn info(&self) -> String {
        "不填充".to_string()
    }
}
