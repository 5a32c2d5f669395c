// crates/mg_interp/src/numerics/regression.rs

//! 测站值对海拔的线性回归
//!
//! 普通最小二乘拟合 `value = intercept + slope * altitude`，并给出相关系数。
//! 相关性不足时可逐个剔除离群点（见 [`fit_with_rejection`]）。

use super::stats::KahanSum;

/// 可接受的最小 |r|
pub const MIN_CORRELATION: f64 = 0.7;

/// 剔除离群点后至少保留的点数
pub const MIN_RETAINED_POINTS: usize = 3;

/// 线性拟合结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// 斜率（递减率）
    pub slope: f64,
    /// 截距
    pub intercept: f64,
    /// 相关系数 r
    pub r: f64,
    /// 参与拟合的点数
    pub n: usize,
}

impl LinearFit {
    /// 在 `x` 处的拟合值
    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// 相关性是否达到阈值
    #[inline]
    pub fn is_significant(&self) -> bool {
        self.r.abs() >= MIN_CORRELATION
    }
}

/// 普通最小二乘拟合
///
/// 少于两个点或 `x` 全部相同时返回 `None`。`y` 全部相同时斜率为 0、r = 1。
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let mx = KahanSum::sum_iter(x[..n].iter().copied()) / nf;
    let my = KahanSum::sum_iter(y[..n].iter().copied()) / nf;

    let mut sxx = KahanSum::new();
    let mut syy = KahanSum::new();
    let mut sxy = KahanSum::new();
    for (xi, yi) in x[..n].iter().zip(&y[..n]) {
        let dx = xi - mx;
        let dy = yi - my;
        sxx.add(dx * dx);
        syy.add(dy * dy);
        sxy.add(dx * dy);
    }
    let (sxx, syy, sxy) = (sxx.value(), syy.value(), sxy.value());

    if sxx <= f64::EPSILON * mx.abs().max(1.0) {
        return None;
    }

    let slope = sxy / sxx;
    let r = if syy > 0.0 {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    } else {
        1.0
    };

    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
        r,
        n,
    })
}

/// 带离群点剔除的拟合结果
#[derive(Debug, Clone, PartialEq)]
pub struct RobustFit {
    /// 最终拟合
    pub fit: LinearFit,
    /// 保留点的下标
    pub retained: Vec<usize>,
}

impl RobustFit {
    /// 被剔除的点数
    pub fn n_rejected(&self, total: usize) -> usize {
        total - self.retained.len()
    }
}

/// 线性拟合，相关性不足时逐个剔除离群点
///
/// 每次剔除使 |r| 提升最多的点，直到 |r| 达到阈值或只剩
/// [`MIN_RETAINED_POINTS`] 个点。
///
/// ```
/// use mg_interp::numerics::regression::fit_with_rejection;
///
/// let alt = [500.0, 1000.0, 1500.0, 2000.0, 2500.0];
/// let ta = [285.0, 281.0, 300.0, 273.0, 269.0];
/// let robust = fit_with_rejection(&alt, &ta).unwrap();
/// assert_eq!(robust.retained, vec![0, 1, 3, 4]);
/// assert!((robust.fit.slope + 0.008).abs() < 1e-12);
/// ```
pub fn fit_with_rejection(x: &[f64], y: &[f64]) -> Option<RobustFit> {
    let mut retained: Vec<usize> = (0..x.len().min(y.len())).collect();
    let mut fit = fit_subset(x, y, &retained)?;

    while !fit.is_significant() && retained.len() > MIN_RETAINED_POINTS {
        let mut best: Option<(usize, LinearFit)> = None;
        for pos in 0..retained.len() {
            let mut trial = retained.clone();
            trial.remove(pos);
            if let Some(candidate) = fit_subset(x, y, &trial) {
                let better = best.map_or(true, |(_, b)| candidate.r.abs() > b.r.abs());
                if better {
                    best = Some((pos, candidate));
                }
            }
        }

        match best {
            Some((pos, candidate)) if candidate.r.abs() > fit.r.abs() => {
                retained.remove(pos);
                fit = candidate;
            }
            _ => break,
        }
    }

    Some(RobustFit { fit, retained })
}

fn fit_subset(x: &[f64], y: &[f64], indices: &[usize]) -> Option<LinearFit> {
    let xs: Vec<f64> = indices.iter().map(|&k| x[k]).collect();
    let ys: Vec<f64> = indices.iter().map(|&k| y[k]).collect();
    linear_fit(&xs, &ys)
}
