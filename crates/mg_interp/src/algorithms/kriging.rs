// crates/mg_interp/src/algorithms/kriging.rs

//! `ODKRIG`：普通克里金
//!
//! 名称已注册以便配置可以引用；计算尚未实现，调用时报 `NotImplemented`。

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};

use super::{gather, AlgorithmContext, InterpolationAlgorithm};

/// 拟合变差函数所需的最少测站数
pub const MIN_STATIONS: usize = 7;

/// 普通克里金
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryKriging {
    n_stations: usize,
}

impl OrdinaryKriging {
    /// 算法名
    pub const NAME: &'static str = "ODKRIG";
}

impl InterpolationAlgorithm for OrdinaryKriging {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.n_stations = gather(param, ctx.observations).len();
    }

    fn quality_rating(&self) -> f64 {
        if self.n_stations < MIN_STATIONS {
            0.0
        } else {
            0.9
        }
    }

    fn calculate(
        &mut self,
        _dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        _grid: &mut Grid2D,
    ) -> MgResult<()> {
        Err(MgError::not_implemented("ODKRIG 普通克里金插值"))
    }

    fn info(&self) -> String {
        format!("{} 站", self.n_stations)
    }
}
