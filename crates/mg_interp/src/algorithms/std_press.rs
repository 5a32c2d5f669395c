// crates/mg_interp/src/algorithms/std_press.rs

//! `STD_PRESS`：由地形高程按标准大气给出气压
//!
//! 不依赖测站，因此没有测站时也能成功。`use_residuals` 时加上
//! 测站观测与标准大气之差的平均值。

use mg_foundation::error::MgResult;
use mg_meteo::atmosphere::std_air_pressure;
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};

use super::{fill_cells, gather, AlgorithmArgs, AlgorithmContext, InterpolationAlgorithm};
use crate::numerics::stats;

/// 标准大气气压
#[derive(Debug, Clone, Default)]
pub struct StandardPressure {
    use_residuals: bool,
    param: Option<MeteoParam>,
    residuals: Vec<f64>,
    info: String,
}

impl StandardPressure {
    /// 算法名
    pub const NAME: &'static str = "STD_PRESS";

    /// 创建算法实例
    pub fn new(use_residuals: bool) -> Self {
        Self {
            use_residuals,
            ..Default::default()
        }
    }

    /// 解析 `use_residuals`
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> MgResult<bool> {
        let mut args = AlgorithmArgs::parse(Self::NAME, args)?;
        let use_residuals = args.flag("use_residuals")?;
        args.finish()?;
        Ok(use_residuals)
    }
}

impl InterpolationAlgorithm for StandardPressure {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.param = Some(param);
        self.residuals = gather(param, ctx.observations)
            .iter()
            .map(|m| m.value - std_air_pressure(m.altitude()))
            .collect();
    }

    fn quality_rating(&self) -> f64 {
        if self.param != Some(MeteoParam::P) {
            0.0
        } else if self.residuals.len() <= 1 || self.use_residuals {
            1.0
        } else {
            0.1
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        let offset = if self.use_residuals {
            stats::mean(&self.residuals).unwrap_or(0.0)
        } else {
            0.0
        };
        fill_cells(dem, grid, |_, _, z| Some(std_air_pressure(z) + offset));

        self.info = if self.use_residuals {
            format!("{} 站, 平均残差 {:.1} Pa", self.residuals.len(), offset)
        } else {
            "标准大气".to_string()
        };
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}
