// crates/mg_interp/src/numerics/weighting.rs

//! 反距离加权
//!
//! $$
//! z(x) = \frac{\sum_i w(d_i)\, z_i}{\sum_i w(d_i)}
//! $$
//!
//! 权重核 $w(d)$ 可选 $1/d$、$1/d^2$ 或 $1/\sqrt{d}$。目标点与某测站的
//! 距离小于容差时直接返回该测站的值。

use mg_foundation::error::{MgError, MgResult};
use mg_geo::{Point2D, SpatialIndex};
use std::str::FromStr;

/// 距离容差 [m]
pub const DISTANCE_TOLERANCE: f64 = 1e-6;

/// 权重核
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightKernel {
    /// 1/d
    Inverse,
    /// 1/d²
    #[default]
    InverseSquare,
    /// 1/√d
    InverseSqrt,
}

impl WeightKernel {
    /// 距离 `d` 处的权重
    #[inline]
    pub fn weight(self, d: f64) -> f64 {
        match self {
            Self::Inverse => 1.0 / d,
            Self::InverseSquare => 1.0 / (d * d),
            Self::InverseSqrt => 1.0 / d.sqrt(),
        }
    }

    /// 参数中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Inverse => "inv",
            Self::InverseSquare => "inv2",
            Self::InverseSqrt => "invsqrt",
        }
    }
}

impl FromStr for WeightKernel {
    type Err = MgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inv" => Ok(Self::Inverse),
            "inv2" => Ok(Self::InverseSquare),
            "invsqrt" => Ok(Self::InverseSqrt),
            other => Err(MgError::invalid_input(format!(
                "未知的权重核 '{other}'，可选 inv、inv2、invsqrt"
            ))),
        }
    }
}

/// IDW 插值器
///
/// 采样点一次性建立 R-tree 索引；[`interpolate_nearest`](Self::interpolate_nearest)
/// 只使用最近的 k 个点。
#[derive(Debug)]
pub struct IdwInterpolator {
    points: Vec<Point2D>,
    values: Vec<f64>,
    kernel: WeightKernel,
    index: SpatialIndex<usize>,
}

impl IdwInterpolator {
    /// 创建插值器
    pub fn new(points: Vec<Point2D>, values: Vec<f64>) -> MgResult<Self> {
        MgError::check_size("idw values", points.len(), values.len())?;
        let index = SpatialIndex::bulk_load(points.iter().copied().zip(0..).collect());
        Ok(Self {
            points,
            values,
            kernel: WeightKernel::default(),
            index,
        })
    }

    /// 设置权重核
    pub fn with_kernel(mut self, kernel: WeightKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// 采样点数量
    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// 权重核
    #[inline]
    pub fn kernel(&self) -> WeightKernel {
        self.kernel
    }

    /// 用全部采样点在 `target` 处插值
    pub fn interpolate(&self, target: &Point2D) -> Option<f64> {
        self.weighted((0..self.points.len()).map(|k| (k, self.points[k].distance_to(target))))
    }

    /// 用最近的 `k` 个采样点插值
    pub fn interpolate_nearest(&self, target: &Point2D, k: usize) -> Option<f64> {
        let nearest = self
            .index
            .query_nearest(target, k)
            .into_iter()
            .map(|(p, &idx)| (idx, p.distance_to(target)));
        self.weighted(nearest)
    }

    /// 最近的 `k` 个采样点的下标，按距离升序
    pub fn nearest_indices(&self, target: &Point2D, k: usize) -> Vec<usize> {
        self.index
            .query_nearest(target, k)
            .into_iter()
            .map(|(_, &idx)| idx)
            .collect()
    }

    fn weighted<I>(&self, candidates: I) -> Option<f64>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        weighted_mean(
            self.kernel,
            candidates.into_iter().map(|(idx, dist)| (dist, self.values[idx])),
        )
    }
}

/// 按 (距离, 值) 样本求加权平均
///
/// 任一样本距离小于 [`DISTANCE_TOLERANCE`] 时返回该样本的值。
pub fn weighted_mean<I>(kernel: WeightKernel, samples: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut weight_sum = 0.0;
    let mut value_sum = 0.0;
    for (dist, value) in samples {
        if dist < DISTANCE_TOLERANCE {
            return Some(value);
        }
        let w = kernel.weight(dist);
        weight_sum += w;
        value_sum += w * value;
    }

    (weight_sum > 0.0).then(|| value_sum / weight_sum)
}
