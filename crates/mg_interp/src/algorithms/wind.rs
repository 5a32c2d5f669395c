// crates/mg_interp/src/algorithms/wind.rs

//! `WIND_CURV`：地形修正风场（Liston & Elder, 2006）
//!
//! 风速用 `IDW_LAPSE` 插值，风向由 U/V 分量的 IDW 得到，然后按坡度和曲率修正：
//!
//! $$
//! \Omega_s = \frac{\beta \cos(\xi - \theta)}{2 \beta_{max}}, \quad
//! W_w = 1 + \gamma_s \Omega_s + \gamma_c \Omega_c
//! $$
//!
//! $$
//! \theta_d = -\frac{1}{2} \Omega_s \sin\big(2(\xi - \theta)\big)
//! $$
//!
//! 其中 β 为坡度，ξ 为坡向，θ 为风向，Ωc 为归一化曲率。
//! 修正后风速 = VW·Ww，风向 = DW + θd。

use mg_foundation::error::{MgError, MgResult};
use mg_geo::normalize_degrees;
use mg_meteo::atmosphere::{wind_components, wind_direction};
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};

use super::idw::interpolate_idw;
use super::lapse::{interpolate_idw_lapse, LapseSettings};
use super::{AlgorithmContext, InterpolationAlgorithm, Measurement};

/// 坡度权重 γs
pub const SLOPE_WEIGHT: f64 = 0.58;
/// 曲率权重 γc
pub const CURVATURE_WEIGHT: f64 = 0.42;

/// 单元上的地形修正：返回 (风速系数 Ww, 风向偏转 [°])
///
/// `slope`、`azimuth`、`direction`、`max_slope` 均为度。
pub fn terrain_correction(
    slope: f64,
    azimuth: f64,
    curvature: f64,
    direction: f64,
    max_slope: f64,
) -> (f64, f64) {
    let omega_s = if max_slope > 0.0 {
        slope.to_radians() * (direction - azimuth).to_radians().cos() / (2.0 * max_slope.to_radians())
    } else {
        0.0
    };
    let weight = 1.0 + SLOPE_WEIGHT * omega_s + CURVATURE_WEIGHT * curvature;
    let diverting = -0.5 * omega_s * (2.0 * (azimuth - direction).to_radians()).sin();
    (weight, diverting.to_degrees())
}

/// 地形修正风场
#[derive(Debug, Clone)]
pub struct WindCurvature {
    settings: LapseSettings,
    param: Option<MeteoParam>,
    speeds: Vec<Measurement>,
    u: Vec<Measurement>,
    v: Vec<Measurement>,
    info: String,
}

impl WindCurvature {
    /// 算法名
    pub const NAME: &'static str = "WIND_CURV";

    /// 创建算法实例；`settings` 用于风速插值
    pub fn new(settings: LapseSettings) -> Self {
        Self {
            settings,
            param: None,
            speeds: Vec::new(),
            u: Vec::new(),
            v: Vec::new(),
            info: String::new(),
        }
    }
}

impl InterpolationAlgorithm for WindCurvature {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.param = Some(param);
        self.speeds.clear();
        self.u.clear();
        self.v.clear();
        for md in ctx.observations {
            if let (Some(vw), Some(dw)) = (md.get(MeteoParam::Vw), md.get(MeteoParam::Dw)) {
                let (u, v) = wind_components(vw, dw);
                let position = md.station.position;
                self.speeds.push(Measurement::new(vw, position));
                self.u.push(Measurement::new(u, position));
                self.v.push(Measurement::new(v, position));
            }
        }
    }

    fn quality_rating(&self) -> f64 {
        if !matches!(self.param, Some(MeteoParam::Vw | MeteoParam::Dw)) {
            return 0.0;
        }
        match self.speeds.len() {
            0 => 0.0,
            1 => 0.5,
            _ => 0.9,
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        if !dem.has_slope() || !dem.has_curvature() {
            return Err(MgError::interpolation_failed(Self::NAME, "DEM 未计算坡度或曲率"));
        }
        if self.speeds.is_empty() {
            return Err(MgError::interpolation_failed(Self::NAME, "没有同时观测 VW 与 DW 的测站"));
        }

        let geometry = *dem.geometry();
        let mut speed = Grid2D::empty(geometry);
        let estimate = interpolate_idw_lapse(Self::NAME, &self.speeds, &self.settings, dem, &mut speed)?;
        let mut u = Grid2D::empty(geometry);
        let mut v = Grid2D::empty(geometry);
        interpolate_idw(Self::NAME, &self.u, self.settings.kernel, dem, &mut u)?;
        interpolate_idw(Self::NAME, &self.v, self.settings.kernel, dem, &mut v)?;
        let direction = u.zip_map(&v, |u, v| Some(wind_direction(u, v)))?;

        let max_slope = dem.stats().max_slope.unwrap_or(0.0);
        let want_speed = self.param != Some(MeteoParam::Dw);
        grid.reset(geometry);
        for j in 0..geometry.nrows {
            for i in 0..geometry.ncols {
                let (Some(vw), Some(dw)) = (speed.get(i, j), direction.get(i, j)) else {
                    continue;
                };
                let (weight, diverting) = match (
                    dem.slope().get(i, j),
                    dem.azimuth().get(i, j),
                    dem.curvature().get(i, j),
                ) {
                    (Some(s), Some(a), Some(c)) => terrain_correction(s, a, c, dw, max_slope),
                    _ => (1.0, 0.0),
                };
                let value = if want_speed {
                    (vw * weight).max(0.0)
                } else {
                    normalize_degrees(dw + diverting)
                };
                grid.set(i, j, Some(value));
            }
        }

        self.info = format!("{} 站, 风速 {}", self.speeds.len(), estimate);
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use mg_meteo::MeteoData;
    use mg_terrain::TerrainLayers;

    fn westerly(stations: &[(f64, f64, f64, f64)]) -> Vec<MeteoData> {
        let mut obs = observations(MeteoParam::Vw, stations);
        for md in &mut obs {
            md.set(MeteoParam::Dw, Some(270.0));
        }
        obs
    }

    #[test]
    fn test_ratings() {
        let obs = westerly(&[(0.0, 0.0, 1000.0, 5.0), (200.0, 0.0, 1000.0, 5.0)]);
        let mut algo = WindCurvature::new(LapseSettings::default());
        algo.initialize(MeteoParam::Ta, &AlgorithmContext::new(date(), &obs));
        assert_eq!(algo.quality_rating(), 0.0);
        algo.initialize(MeteoParam::Dw, &AlgorithmContext::new(date(), &obs[..1]));
        assert_eq!(algo.quality_rating(), 0.5);
        algo.initialize(MeteoParam::Vw, &AlgorithmContext::new(date(), &obs));
        assert_eq!(algo.quality_rating(), 0.9);
    }

    #[test]
    fn test_flat_terrain_unchanged() {
        let (w, d) = terrain_correction(0.0, 0.0, 0.0, 123.0, 30.0);
        assert_eq!(w, 1.0);
        assert_eq!(d, 0.0);
        // 迎风坡加速，背风坡减速
        let (up, _) = terrain_correction(20.0, 270.0, 0.0, 270.0, 20.0);
        let (down, _) = terrain_correction(20.0, 90.0, 0.0, 270.0, 20.0);
        assert!((up - 1.29).abs() < 1e-12);
        assert!((down - 0.71).abs() < 1e-12);
    }

    #[test]
    fn test_ridge_accelerates_wind() {
        let obs = westerly(&[(0.0, 0.0, 1000.0, 5.0), (300.0, 300.0, 1000.0, 5.0)]);
        let ctx = AlgorithmContext::new(date(), &obs);
        let dem = dem_from(3, 3, |i, j| Some(if (i, j) == (1, 1) { 1100.0 } else { 1000.0 }));
        let mut algo = WindCurvature::new(LapseSettings::default());
        algo.initialize(MeteoParam::Vw, &ctx);

        let mut grid = Grid2D::empty(*dem.geometry());
        algo.calculate(&dem, &ctx, &mut grid).unwrap();
        // 峰顶坡度为零，曲率归一化到 0.5
        assert!((grid.get(1, 1).unwrap() - 5.0 * (1.0 + CURVATURE_WEIGHT * 0.5)).abs() < 1e-9);

        algo.initialize(MeteoParam::Dw, &ctx);
        algo.calculate(&dem, &ctx, &mut grid).unwrap();
        assert!((grid.get(1, 1).unwrap() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_requires_curvature() {
        let obs = westerly(&[(0.0, 0.0, 1000.0, 5.0)]);
        let ctx = AlgorithmContext::new(date(), &obs);
        let flat = flat_dem(2, 2, 1000.0);
        let dem = TerrainModel::with_layers(flat.elevation().clone(), TerrainLayers::NONE);
        let mut algo = WindCurvature::new(LapseSettings::default());
        algo.initialize(MeteoParam::Vw, &ctx);

        let mut grid = Grid2D::empty(*dem.geometry());
        assert!(matches!(
            algo.calculate(&dem, &ctx, &mut grid),
            Err(MgError::InterpolationFailed { .. })
        ));
    }
}
