// crates/mg_interp/src/algorithms/lapse.rs

//! 海拔递减率类算法：`AVG_LAPSE`、`IDW_LAPSE`、`LIDW_LAPSE`
//!
//! 三者共享同一套趋势估计：
//!
//! - 给定固定递减率且非 `soft` 时直接使用；
//! - 否则对测站值做海拔回归（相关性不足时剔除离群点）；
//! - `soft` 模式下回归不可用（不足两个不同海拔或 |r| < 0.7）才退回固定递减率；
//! - `frac` 使用比例投影，参考海拔为测站平均海拔。
//!
//! 去趋势后的残差分别取平均（`AVG_LAPSE`）、全局 IDW（`IDW_LAPSE`）
//! 或最近 N 站的局部回归 + IDW（`LIDW_LAPSE`），再在每个单元恢复趋势。

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};
use std::fmt;

use super::{fill_cells, gather, AlgorithmArgs, AlgorithmContext, InterpolationAlgorithm, Measurement};
use crate::numerics::regression::{fit_with_rejection, LinearFit};
use crate::numerics::stats;
use crate::numerics::trend::{Trend, TrendKind};
use crate::numerics::weighting::{weighted_mean, IdwInterpolator, WeightKernel};

/// `LIDW_LAPSE` 默认邻站数
pub const DEFAULT_NEIGHBORS: usize = 7;

// ============================================================================
// 参数
// ============================================================================

/// 递减率类算法的参数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LapseSettings {
    /// 固定递减率
    pub rate: Option<f64>,
    /// 仅在回归不可用时使用固定递减率
    pub soft: bool,
    /// 趋势投影方式
    pub kind: TrendKind,
    /// IDW 权重核
    pub kernel: WeightKernel,
}

impl LapseSettings {
    /// 从参数中取走 `[rate]`、`rate=`、`soft`、`frac`、`kernel=`
    pub fn take_from(args: &mut AlgorithmArgs) -> MgResult<Self> {
        let rate = args.number_or_positional("rate")?;
        let soft = args.flag("soft")?;
        let kind = if args.flag("frac")? {
            TrendKind::Fractional
        } else {
            TrendKind::Linear
        };
        let kernel = match args.string("kernel")? {
            Some(k) => k
                .parse()
                .map_err(|e: MgError| MgError::invalid_argument(args.algorithm(), e.to_string()))?,
            None => WeightKernel::default(),
        };
        if soft && rate.is_none() {
            return Err(MgError::invalid_argument(
                args.algorithm(),
                "soft 模式需要给定递减率",
            ));
        }
        Ok(Self {
            rate,
            soft,
            kind,
            kernel,
        })
    }

    /// 解析完整参数列表
    pub fn parse<S: AsRef<str>>(algorithm: &'static str, args: &[S]) -> MgResult<Self> {
        let mut args = AlgorithmArgs::parse(algorithm, args)?;
        let settings = Self::take_from(&mut args)?;
        args.finish()?;
        Ok(settings)
    }

    /// 是否强制使用固定递减率
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.rate.is_some() && !self.soft
    }
}

// ============================================================================
// 趋势估计
// ============================================================================

/// 趋势来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendSource {
    /// 测站回归
    Regression,
    /// 用户给定
    Fixed,
    /// 无趋势
    Flat,
}

/// 趋势估计结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendEstimate {
    /// 趋势
    pub trend: Trend,
    /// 来源
    pub source: TrendSource,
    /// 回归结果（若做过回归）
    pub fit: Option<LinearFit>,
    /// 剔除的离群测站数
    pub n_rejected: usize,
}

impl fmt::Display for TrendEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.trend.kind {
            TrendKind::Linear => "/m",
            TrendKind::Fractional => " (比例)/m",
        };
        match self.source {
            TrendSource::Fixed => write!(f, "固定递减率 {:.6}{unit}", self.trend.rate),
            TrendSource::Flat => write!(f, "无海拔趋势"),
            TrendSource::Regression => {
                write!(f, "回归递减率 {:.6}{unit}", self.trend.rate)?;
                if let Some(fit) = &self.fit {
                    write!(f, ", r={:.3}", fit.r)?;
                }
                if self.n_rejected > 0 {
                    write!(f, ", 剔除 {} 站", self.n_rejected)?;
                }
                Ok(())
            }
        }
    }
}

fn fixed_trend(rate: f64, kind: TrendKind, ref_altitude: f64) -> Trend {
    match kind {
        TrendKind::Linear => Trend::linear(rate),
        TrendKind::Fractional => Trend::fractional(rate, ref_altitude),
    }
}

/// 由测站值估计海拔趋势
pub fn estimate_trend(measurements: &[Measurement], settings: &LapseSettings) -> TrendEstimate {
    let altitudes: Vec<f64> = measurements.iter().map(Measurement::altitude).collect();
    let values: Vec<f64> = measurements.iter().map(|m| m.value).collect();
    let ref_altitude = stats::mean(&altitudes).unwrap_or(0.0);

    let fixed = |rate: f64, fit: Option<LinearFit>| TrendEstimate {
        trend: fixed_trend(rate, settings.kind, ref_altitude),
        source: TrendSource::Fixed,
        fit,
        n_rejected: 0,
    };

    if let (Some(rate), false) = (settings.rate, settings.soft) {
        return fixed(rate, None);
    }

    let robust = fit_with_rejection(&altitudes, &values);
    let regression = robust.as_ref().and_then(|r| {
        Trend::from_slope(settings.kind, r.fit.slope, ref_altitude, r.fit.predict(ref_altitude)).map(
            |trend| TrendEstimate {
                trend,
                source: TrendSource::Regression,
                fit: Some(r.fit),
                n_rejected: r.n_rejected(measurements.len()),
            },
        )
    });

    match (regression, settings.rate) {
        (Some(est), _) if est.fit.map_or(false, |f| f.is_significant()) => est,
        (est, Some(rate)) => {
            log::debug!("回归不可用，使用固定递减率 {rate}");
            fixed(rate, est.and_then(|e| e.fit))
        }
        (Some(est), None) => {
            log::warn!(
                "海拔回归相关性不足 (|r|={:.3})，仍使用回归递减率",
                est.fit.map_or(0.0, |f| f.r.abs())
            );
            est
        }
        (None, None) => TrendEstimate {
            trend: Trend::flat(),
            source: TrendSource::Flat,
            fit: None,
            n_rejected: 0,
        },
    }
}

/// 去除趋势后的测站值；比例因子为零的测站被丢弃
pub fn detrended(measurements: &[Measurement], trend: &Trend) -> Vec<Measurement> {
    measurements
        .iter()
        .filter_map(|m| {
            trend
                .detrend(m.value, m.altitude())
                .map(|r| Measurement::new(r, m.position))
        })
        .collect()
}

/// 海拔回归 + 残差 IDW 填充栅格
///
/// `RH`、`WIND_CURV` 等组合算法也使用此函数。
pub fn interpolate_idw_lapse(
    algorithm: &'static str,
    measurements: &[Measurement],
    settings: &LapseSettings,
    dem: &TerrainModel,
    grid: &mut Grid2D,
) -> MgResult<TrendEstimate> {
    if measurements.is_empty() {
        return Err(MgError::interpolation_failed(algorithm, "没有有效测站数据"));
    }

    let estimate = estimate_trend(measurements, settings);
    let residuals = detrended(measurements, &estimate.trend);
    if residuals.is_empty() {
        return Err(MgError::interpolation_failed(algorithm, "去趋势后没有有效测站"));
    }

    let idw = IdwInterpolator::new(
        residuals.iter().map(Measurement::point).collect(),
        residuals.iter().map(|m| m.value).collect(),
    )?
    .with_kernel(settings.kernel);

    let geometry = *dem.geometry();
    let trend = estimate.trend;
    fill_cells(dem, grid, |i, j, z| {
        idw.interpolate(&geometry.cell_center(i, j))
            .map(|r| trend.retrend(r, z))
    });
    Ok(estimate)
}

// ============================================================================
// AVG_LAPSE
// ============================================================================

/// 海拔回归 + 平均残差
#[derive(Debug, Clone)]
pub struct AvgLapse {
    settings: LapseSettings,
    measurements: Vec<Measurement>,
    info: String,
}

impl AvgLapse {
    /// 算法名
    pub const NAME: &'static str = "AVG_LAPSE";

    /// 创建算法实例
    pub fn new(settings: LapseSettings) -> Self {
        Self {
            settings,
            measurements: Vec::new(),
            info: String::new(),
        }
    }
}

impl InterpolationAlgorithm for AvgLapse {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.measurements = gather(param, ctx.observations);
    }

    fn quality_rating(&self) -> f64 {
        match self.measurements.len() {
            0 => 0.0,
            1 if self.settings.rate.is_some() => 0.1,
            1 => 0.0,
            2 => 0.7,
            _ => 0.2,
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        if self.measurements.is_empty() {
            return Err(MgError::interpolation_failed(Self::NAME, "没有有效测站数据"));
        }

        let estimate = estimate_trend(&self.measurements, &self.settings);
        let residuals: Vec<f64> = detrended(&self.measurements, &estimate.trend)
            .into_iter()
            .map(|m| m.value)
            .collect();
        let mean = stats::mean(&residuals)
            .ok_or_else(|| MgError::interpolation_failed(Self::NAME, "去趋势后没有有效测站"))?;

        let trend = estimate.trend;
        fill_cells(dem, grid, |_, _, z| Some(trend.retrend(mean, z)));

        self.info = format!(
            "{} 站, {}, 平均残差 {:.3}",
            self.measurements.len(),
            estimate,
            mean
        );
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}

// ============================================================================
// IDW_LAPSE
// ============================================================================

/// 海拔回归 + 残差 IDW
#[derive(Debug, Clone)]
pub struct IdwLapse {
    settings: LapseSettings,
    measurements: Vec<Measurement>,
    info: String,
}

impl IdwLapse {
    /// 算法名
    pub const NAME: &'static str = "IDW_LAPSE";

    /// 创建算法实例
    pub fn new(settings: LapseSettings) -> Self {
        Self {
            settings,
            measurements: Vec::new(),
            info: String::new(),
        }
    }
}

impl InterpolationAlgorithm for IdwLapse {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.measurements = gather(param, ctx.observations);
    }

    fn quality_rating(&self) -> f64 {
        match self.measurements.len() {
            0 => 0.0,
            1 if self.settings.rate.is_some() => 0.5,
            1 => 0.0,
            _ => 0.7,
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        let estimate =
            interpolate_idw_lapse(Self::NAME, &self.measurements, &self.settings, dem, grid)?;
        self.info = format!(
            "{} 站, {}, 权重 {}",
            self.measurements.len(),
            estimate,
            self.settings.kernel.name()
        );
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}

// ============================================================================
// LIDW_LAPSE
// ============================================================================

/// 局部海拔回归 + IDW
///
/// 每个单元只使用最近的 N 个测站：先用这 N 站回归（不可用时退回全局趋势），
/// 再对它们的残差做 IDW。
#[derive(Debug, Clone)]
pub struct LocalIdwLapse {
    settings: LapseSettings,
    neighbors: usize,
    measurements: Vec<Measurement>,
    info: String,
}

impl LocalIdwLapse {
    /// 算法名
    pub const NAME: &'static str = "LIDW_LAPSE";

    /// 创建算法实例
    pub fn new(settings: LapseSettings, neighbors: usize) -> Self {
        Self {
            settings,
            neighbors,
            measurements: Vec::new(),
            info: String::new(),
        }
    }

    /// 解析 `[neighbors] [rate]` 及关键字参数
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> MgResult<(LapseSettings, usize)> {
        let mut args = AlgorithmArgs::parse(Self::NAME, args)?;
        let neighbors = match args.number_or_positional("neighbors")? {
            Some(n) => args.to_count("neighbors", n, 2)?,
            None => DEFAULT_NEIGHBORS,
        };
        let settings = LapseSettings::take_from(&mut args)?;
        args.finish()?;
        Ok((settings, neighbors))
    }

    fn local_trend(&self, local: &[Measurement], global: &Trend) -> Trend {
        if self.settings.is_fixed() {
            return *global;
        }
        let altitudes: Vec<f64> = local.iter().map(Measurement::altitude).collect();
        let values: Vec<f64> = local.iter().map(|m| m.value).collect();
        let ref_altitude = stats::mean(&altitudes).unwrap_or(0.0);

        fit_with_rejection(&altitudes, &values)
            .filter(|r| r.fit.is_significant())
            .and_then(|r| {
                Trend::from_slope(self.settings.kind, r.fit.slope, ref_altitude, r.fit.predict(ref_altitude))
            })
            .unwrap_or(*global)
    }
}

impl InterpolationAlgorithm for LocalIdwLapse {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.measurements = gather(param, ctx.observations);
    }

    fn quality_rating(&self) -> f64 {
        let n = self.measurements.len();
        if n < 2 {
            0.0
        } else if n < self.neighbors {
            0.3
        } else {
            0.7
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        if self.measurements.is_empty() {
            return Err(MgError::interpolation_failed(Self::NAME, "没有有效测站数据"));
        }

        let global = estimate_trend(&self.measurements, &self.settings);
        let index = IdwInterpolator::new(
            self.measurements.iter().map(Measurement::point).collect(),
            self.measurements.iter().map(|m| m.value).collect(),
        )?;

        let geometry = *dem.geometry();
        let kernel = self.settings.kernel;
        let this = &*self;
        fill_cells(dem, grid, |i, j, z| {
            let target = geometry.cell_center(i, j);
            let local: Vec<Measurement> = index
                .nearest_indices(&target, this.neighbors)
                .into_iter()
                .map(|k| this.measurements[k].clone())
                .collect();
            let trend = this.local_trend(&local, &global.trend);
            let samples = local.iter().filter_map(|m| {
                trend
                    .detrend(m.value, m.altitude())
                    .map(|r| (m.point().distance_to(&target), r))
            });
            weighted_mean(kernel, samples).map(|r| trend.retrend(r, z))
        });

        self.info = format!(
            "{} 站, 每单元 {} 邻站, 全局 {}",
            self.measurements.len(),
            self.neighbors,
            global
        );
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

    fn lapse_obs() -> Vec<mg_meteo::MeteoData> {
        observations(
            MeteoParam::Ta,
            &[
                (0.0, 0.0, 1000.0, 280.0),
                (300.0, 0.0, 1500.0, 276.0),
                (0.0, 300.0, 2000.0, 272.0),
            ],
        )
    }

    #[test]
    fn test_settings_parse() {
        let s = LapseSettings::parse("IDW_LAPSE", &["-0.006", "soft", "frac", "kernel=invsqrt"]).unwrap();
        assert_eq!(s.rate, Some(-0.006));
        assert!(s.soft && !s.is_fixed());
        assert_eq!(s.kind, TrendKind::Fractional);
        assert_eq!(s.kernel, WeightKernel::InverseSqrt);

        assert!(LapseSettings::parse("IDW_LAPSE", &["soft"]).is_err());
        assert!(LapseSettings::parse("IDW_LAPSE", &["kernel=gauss"]).is_err());
        assert!(LapseSettings::parse("IDW_LAPSE", &["-0.006", "0.1"]).is_err());
    }

    #[test]
    fn test_lidw_args() {
        let (s, n) = LocalIdwLapse::parse_args(&["5", "-0.0065"]).unwrap();
        assert_eq!(n, 5);
        assert_eq!(s.rate, Some(-0.0065));
        let (_, n) = LocalIdwLapse::parse_args::<&str>(&[]).unwrap();
        assert_eq!(n, DEFAULT_NEIGHBORS);
        assert!(LocalIdwLapse::parse_args(&["1"]).is_err());
    }

    #[test]
    fn test_estimate_regression() {
        let ms = gather(MeteoParam::Ta, &lapse_obs());
        let est = estimate_trend(&ms, &LapseSettings::default());
        assert_eq!(est.source, TrendSource::Regression);
        assert!((est.trend.rate + 0.008).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_fixed_and_soft() {
        let ms = gather(MeteoParam::Ta, &lapse_obs());
        let fixed = LapseSettings {
            rate: Some(-0.0065),
            ..Default::default()
        };
        assert_eq!(estimate_trend(&ms, &fixed).source, TrendSource::Fixed);

        // soft：回归可用时忽略固定值
        let soft = LapseSettings {
            soft: true,
            ..fixed
        };
        let est = estimate_trend(&ms, &soft);
        assert_eq!(est.source, TrendSource::Regression);

        // soft：同一海拔无法回归，退回固定值
        let same_alt = gather(
            MeteoParam::Ta,
            &observations(MeteoParam::Ta, &[(0.0, 0.0, 1000.0, 270.0), (10.0, 0.0, 1000.0, 272.0)]),
        );
        let est = estimate_trend(&same_alt, &soft);
        assert_eq!(est.source, TrendSource::Fixed);
        assert_eq!(est.trend.rate, -0.0065);
    }

    #[test]
    fn test_avg_lapse_ratings() {
        let mut algo = AvgLapse::new(LapseSettings::default());
        let obs = lapse_obs();
        let ctx = AlgorithmContext::new(date(), &obs);
        algo.initialize(MeteoParam::Ta, &ctx);
        assert_eq!(algo.quality_rating(), 0.2);
        algo.initialize(MeteoParam::Ta, &AlgorithmContext::new(date(), &obs[..2]));
        assert_eq!(algo.quality_rating(), 0.7);
        algo.initialize(MeteoParam::Ta, &AlgorithmContext::new(date(), &obs[..1]));
        assert_eq!(algo.quality_rating(), 0.0);

        let mut fixed = AvgLapse::new(LapseSettings {
            rate: Some(-0.0065),
            ..Default::default()
        });
        fixed.initialize(MeteoParam::Ta, &AlgorithmContext::new(date(), &obs[..1]));
        assert_eq!(fixed.quality_rating(), 0.1);
    }

    #[test]
    fn test_idw_lapse_reproduces_lapse() {
        let obs = lapse_obs();
        let ctx = AlgorithmContext::new(date(), &obs);
        let dem = flat_dem(3, 3, 1750.0);
        let mut algo = IdwLapse::new(LapseSettings::default());
        algo.initialize(MeteoParam::Ta, &ctx);
        assert_eq!(algo.quality_rating(), 0.7);

        let mut grid = Grid2D::empty(*dem.geometry());
        algo.calculate(&dem, &ctx, &mut grid).unwrap();
        for v in grid.values() {
            assert!((v.unwrap() - 274.0).abs() < 1e-9);
        }
        assert!(algo.info().contains("3 站"));
    }

    #[test]
    fn test_avg_lapse_fills_masked_dem() {
        let obs = lapse_obs();
        let ctx = AlgorithmContext::new(date(), &obs);
        let dem = dem_from(2, 2, |i, j| (i + j != 2).then_some(1000.0 + 500.0 * (i + j) as f64));
        let mut algo = AvgLapse::new(LapseSettings::default());
        algo.initialize(MeteoParam::Ta, &ctx);

        let mut grid = Grid2D::empty(*dem.geometry());
        algo.calculate(&dem, &ctx, &mut grid).unwrap();
        assert!((grid.get(0, 0).unwrap() - 280.0).abs() < 1e-9);
        assert!((grid.get(1, 0).unwrap() - 276.0).abs() < 1e-9);
        assert_eq!(grid.get(1, 1), None);
    }

    #[test]
    fn test_lidw_lapse_ratings_and_fill() {
        let obs = lapse_obs();
        let ctx = AlgorithmContext::new(date(), &obs);
        let mut algo = LocalIdwLapse::new(LapseSettings::default(), 3);
        algo.initialize(MeteoParam::Ta, &ctx);
        assert_eq!(algo.quality_rating(), 0.7);

        let dem = flat_dem(2, 2, 1250.0);
        let mut grid = Grid2D::empty(*dem.geometry());
        algo.calculate(&dem, &ctx, &mut grid).unwrap();
        for v in grid.values() {
            assert!((v.unwrap() - 278.0).abs() < 1e-9);
        }

        let mut wide = LocalIdwLapse::new(LapseSettings::default(), 5);
        wide.initialize(MeteoParam::Ta, &ctx);
        assert_eq!(wide.quality_rating(), 0.3);
    }

    #[test]
    fn test_zero_stations_fail() {
        let obs = lapse_obs();
        let ctx = AlgorithmContext::new(date(), &obs);
        let dem = flat_dem(2, 2, 1000.0);
        let mut grid = Grid2D::empty(*dem.geometry());

        let mut algo = IdwLapse::new(LapseSettings::default());
        algo.initialize(MeteoParam::Rh, &ctx);
        assert_eq!(algo.quality_rating(), 0.0);
        assert!(matches!(
            algo.calculate(&dem, &ctx, &mut grid),
            Err(MgError::InterpolationFailed { .. })
        ));
    }
}
