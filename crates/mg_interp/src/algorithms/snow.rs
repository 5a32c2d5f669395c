// crates/mg_interp/src/algorithms/snow.rs

//! `PSUM_SNOW`：地形再分配的降水
//!
//! 先由基础算法（默认 `IDW_LAPSE`）得到降水场，再按地形调整：
//!
//! - 坡度 > 60°：雪不能停留，系数 0；40°–60°：线性递减 `(60 - s) / 20`；
//! - 曲率：山脊（正曲率）减少、洼地（负曲率）增加，系数 `1 - Ωc`。
//!
//! 调整后整体缩放，使全域降水总量（即平均值）不变。

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};
use std::fmt;

use super::{AlgorithmContext, InterpolationAlgorithm};
use crate::numerics::stats::KahanSum;

/// 默认基础算法
pub const DEFAULT_BASE: &str = "IDW_LAPSE";

/// 开始减少积雪的坡度 [°]
pub const SLOPE_START: f64 = 40.0;
/// 完全不积雪的坡度 [°]
pub const SLOPE_STOP: f64 = 60.0;

/// 坡度系数
#[inline]
pub fn slope_factor(slope: f64) -> f64 {
    if slope > SLOPE_STOP {
        0.0
    } else if slope > SLOPE_START {
        (SLOPE_STOP - slope) / (SLOPE_STOP - SLOPE_START)
    } else {
        1.0
    }
}

/// 曲率系数，曲率已归一化到 [-0.5, 0.5]
#[inline]
pub fn curvature_factor(curvature: f64) -> f64 {
    1.0 - curvature
}

/// 拆分 `[base] [base args…]` 或 `base=NAME [base args…]`
///
/// 返回基础算法名与转交给它的参数。
pub fn split_base_args<S: AsRef<str>>(args: &[S]) -> MgResult<(String, Vec<String>)> {
    let mut base = None;
    let mut rest = Vec::with_capacity(args.len());

    for (k, raw) in args.iter().enumerate() {
        let token = raw.as_ref().trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("base") => {
                if base.is_some() {
                    return Err(MgError::invalid_argument(PsumSnow::NAME, "重复的基础算法"));
                }
                base = Some(value.trim().to_string());
            }
            None if k == 0 && token.parse::<f64>().is_err() => base = Some(token.to_string()),
            _ => rest.push(token.to_string()),
        }
    }

    let base = base.unwrap_or_else(|| DEFAULT_BASE.to_string());
    if base.is_empty() {
        return Err(MgError::invalid_argument(PsumSnow::NAME, "基础算法名为空"));
    }
    if base.eq_ignore_ascii_case(PsumSnow::NAME) {
        return Err(MgError::invalid_argument(PsumSnow::NAME, "基础算法不能是 PSUM_SNOW"));
    }
    Ok((base, rest))
}

/// 地形再分配的降水
pub struct PsumSnow {
    base: Box<dyn InterpolationAlgorithm>,
    param: Option<MeteoParam>,
    info: String,
}

impl PsumSnow {
    /// 算法名
    pub const NAME: &'static str = "PSUM_SNOW";

    /// 包装基础算法
    pub fn new(base: Box<dyn InterpolationAlgorithm>) -> Self {
        Self {
            base,
            param: None,
            info: String::new(),
        }
    }

    /// 对已填充的降水场做地形再分配，返回缩放系数
    ///
    /// 调整后总量非正时保留原值并返回 `None`。
    pub fn redistribute(dem: &TerrainModel, grid: &mut Grid2D) -> Option<f64> {
        let geometry = *grid.geometry();
        let mut adjusted = grid.clone();
        for j in 0..geometry.nrows {
            for i in 0..geometry.ncols {
                let Some(v) = grid.get(i, j) else {
                    continue;
                };
                let mut factor = 1.0;
                if dem.has_slope() {
                    factor *= dem.slope().get(i, j).map_or(1.0, slope_factor);
                }
                if dem.has_curvature() {
                    factor *= dem.curvature().get(i, j).map_or(1.0, curvature_factor);
                }
                adjusted.set(i, j, Some(v * factor));
            }
        }

        let before = KahanSum::sum_iter(grid.values().iter().flatten().copied());
        let after = KahanSum::sum_iter(adjusted.values().iter().flatten().copied());
        if before == 0.0 {
            return Some(1.0);
        }
        if after <= 0.0 {
            log::warn!("降水再分配后总量为 {after}，保留基础算法结果");
            return None;
        }

        let scale = before / after;
        for v in adjusted.values_mut().iter_mut().flatten() {
            *v *= scale;
        }
        *grid = adjusted;
        Some(scale)
    }
}

impl fmt::Debug for PsumSnow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PsumSnow")
            .field("base", &self.base.name())
            .field("param", &self.param)
            .finish()
    }
}

impl InterpolationAlgorithm for PsumSnow {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.param = Some(param);
        self.base.initialize(param, ctx);
    }

    fn quality_rating(&self) -> f64 {
        if self.param == Some(MeteoParam::Psum) {
            self.base.quality_rating()
        } else {
            0.0
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        self.base.calculate(dem, ctx, grid)?;
        if !dem.has_slope() && !dem.has_curvature() {
            log::warn!("DEM 未计算坡度与曲率，跳过降水再分配");
        }
        let scale = Self::redistribute(dem, grid);

        self.info = match scale {
            Some(s) => format!("{}: {}, 再分配缩放 {:.4}", self.base.name(), self.base.info(), s),
            None => format!("{}: {}, 未再分配", self.base.name(), self.base.info()),
        };
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}
