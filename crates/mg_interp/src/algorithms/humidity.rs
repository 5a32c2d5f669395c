// crates/mg_interp/src/algorithms/humidity.rs

//! `RH`：经露点插值相对湿度
//!
//! 相对湿度随海拔并不线性变化，露点则近似线性。因此：
//!
//! 1. 对同时有 RH 与 TA 的测站计算露点；
//! 2. 露点做海拔回归 + IDW；
//! 3. 用独立插值得到的 TA 场把露点换回相对湿度。
//!
//! TA 场优先从上下文的参数场提供者获取（通常会走调度器缓存），
//! 不可用时退回到本地 `IDW_LAPSE`。

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::atmosphere::{dew_point_to_rh, rh_to_dew_point};
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};
use std::sync::Arc;

use super::lapse::{interpolate_idw_lapse, LapseSettings};
use super::{gather, AlgorithmContext, InterpolationAlgorithm, Measurement};

/// 相对湿度（露点法）
#[derive(Debug, Clone)]
pub struct RelativeHumidity {
    settings: LapseSettings,
    param: Option<MeteoParam>,
    dew_points: Vec<Measurement>,
    temperatures: Vec<Measurement>,
    n_rh: usize,
    info: String,
}

impl RelativeHumidity {
    /// 算法名
    pub const NAME: &'static str = "RH";

    /// 创建算法实例；`settings` 用于露点插值
    pub fn new(settings: LapseSettings) -> Self {
        Self {
            settings,
            param: None,
            dew_points: Vec::new(),
            temperatures: Vec::new(),
            n_rh: 0,
            info: String::new(),
        }
    }

    fn temperature_field(
        &self,
        dem: &TerrainModel,
        ctx: &AlgorithmContext<'_>,
    ) -> MgResult<Arc<Grid2D>> {
        if let Some(fields) = ctx.fields {
            match fields.field(MeteoParam::Ta, ctx.date, dem) {
                Ok(ta) if ta.geometry().is_same(dem.geometry()) => return Ok(ta),
                Ok(_) => log::warn!("TA 场与 DEM 几何不一致，改用本地 IDW_LAPSE"),
                Err(e) => log::warn!("无法获取 TA 场 ({e})，改用本地 IDW_LAPSE"),
            }
        }

        let mut ta = Grid2D::empty(*dem.geometry());
        interpolate_idw_lapse(
            Self::NAME,
            &self.temperatures,
            &LapseSettings::default(),
            dem,
            &mut ta,
        )?;
        Ok(Arc::new(ta))
    }
}

impl InterpolationAlgorithm for RelativeHumidity {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.param = Some(param);
        self.n_rh = 0;
        self.dew_points.clear();
        for md in ctx.observations {
            let Some(rh) = md.get(MeteoParam::Rh) else {
                continue;
            };
            self.n_rh += 1;
            if let Some(ta) = md.get(MeteoParam::Ta) {
                self.dew_points
                    .push(Measurement::new(rh_to_dew_point(rh, ta), md.station.position));
            }
        }
        self.temperatures = gather(MeteoParam::Ta, ctx.observations);
    }

    fn quality_rating(&self) -> f64 {
        let pairs = self.dew_points.len();
        if self.param != Some(MeteoParam::Rh) || pairs == 0 {
            0.0
        } else if pairs >= 2 && pairs * 2 >= self.n_rh {
            0.9
        } else {
            0.5
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        if self.dew_points.is_empty() {
            return Err(MgError::interpolation_failed(
                Self::NAME,
                "没有同时观测 RH 与 TA 的测站",
            ));
        }

        let estimate = interpolate_idw_lapse(Self::NAME, &self.dew_points, &self.settings, dem, grid)?;
        let ta = self.temperature_field(dem, ctx)?;
        for (rh, t) in grid.values_mut().iter_mut().zip(ta.values()) {
            *rh = match (*rh, *t) {
                (Some(td), Some(t)) => Some(dew_point_to_rh(td, t)),
                _ => None,
            };
        }

        self.info = format!(
            "{} 对 RH/TA (共 {} RH 站), 露点 {}",
            self.dew_points.len(),
            self.n_rh,
            estimate
        );
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}
