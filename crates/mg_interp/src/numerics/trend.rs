// crates/mg_interp/src/numerics/trend.rs

//! 海拔趋势的去除与恢复
//!
//! - 线性：`residual = value - rate * (z - z_ref)`
//! - 比例：`residual = value / f(z)`，`f(z) = max(0, 1 + rate * (z - z_ref))`，
//!   `z_ref` 取测站平均海拔
//!
//! 对任意海拔，`retrend(detrend(v, z), z) == v`（比例模式要求 `f(z) > 0`）。

/// 趋势投影方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendKind {
    /// 加性
    #[default]
    Linear,
    /// 乘性
    Fractional,
}

/// 海拔趋势
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    /// 投影方式
    pub kind: TrendKind,
    /// 递减率：线性为 [单位/m]，比例为 [1/m]
    pub rate: f64,
    /// 参考海拔 [m]
    pub ref_altitude: f64,
}

impl Trend {
    /// 线性趋势
    pub fn linear(rate: f64) -> Self {
        Self {
            kind: TrendKind::Linear,
            rate,
            ref_altitude: 0.0,
        }
    }

    /// 比例趋势
    pub fn fractional(rate: f64, ref_altitude: f64) -> Self {
        Self {
            kind: TrendKind::Fractional,
            rate,
            ref_altitude,
        }
    }

    /// 无趋势
    pub fn flat() -> Self {
        Self::linear(0.0)
    }

    /// 由回归斜率构造；比例模式下把斜率换算为相对参考值的比例
    ///
    /// 参考值为零时比例模式无法换算，返回 `None`。
    pub fn from_slope(kind: TrendKind, slope: f64, ref_altitude: f64, ref_value: f64) -> Option<Self> {
        match kind {
            TrendKind::Linear => Some(Self::linear(slope)),
            TrendKind::Fractional => {
                (ref_value.abs() > f64::EPSILON).then(|| Self::fractional(slope / ref_value, ref_altitude))
            }
        }
    }

    #[inline]
    fn factor(&self, altitude: f64) -> f64 {
        (1.0 + self.rate * (altitude - self.ref_altitude)).max(0.0)
    }

    /// 去除趋势；比例因子为零时返回 `None`
    #[inline]
    pub fn detrend(&self, value: f64, altitude: f64) -> Option<f64> {
        match self.kind {
            TrendKind::Linear => Some(value - self.rate * (altitude - self.ref_altitude)),
            TrendKind::Fractional => {
                let f = self.factor(altitude);
                (f > 0.0).then(|| value / f)
            }
        }
    }

    /// 恢复趋势
    #[inline]
    pub fn retrend(&self, residual: f64, altitude: f64) -> f64 {
        match self.kind {
            TrendKind::Linear => residual + self.rate * (altitude - self.ref_altitude),
            TrendKind::Fractional => residual * self.factor(altitude),
        }
    }
}

impl Default for Trend {
    fn default() -> Self {
        Self::flat()
    }
}
