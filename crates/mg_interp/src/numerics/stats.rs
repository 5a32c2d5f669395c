// crates/mg_interp/src/numerics/stats.rs

//! 基本统计量
//!
//! 求和均使用 Kahan 补偿，测站数虽少但数值跨度可能很大（例如气压）。

/// Kahan 求和器
///
/// ```
/// use mg_interp::numerics::stats::KahanSum;
///
/// let sum = KahanSum::sum_iter(std::iter::repeat(0.1).take(1000));
/// assert!((sum - 100.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    /// 创建新的求和器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个值
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// 当前求和值
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum
    }

    /// 从迭代器求和
    pub fn sum_iter<I: IntoIterator<Item = f64>>(iter: I) -> f64 {
        let mut kahan = Self::new();
        for v in iter {
            kahan.add(v);
        }
        kahan.value()
    }
}

/// 算术平均，空输入返回 `None`
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(KahanSum::sum_iter(values.iter().copied()) / values.len() as f64)
}

/// 最小值
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// 最大值
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// 样本标准差，少于两个值时返回 `None`
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = KahanSum::sum_iter(values.iter().map(|v| (v - m) * (v - m)));
    Some((ss / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_extrema() {
        let v = [3.0, -1.0, 4.0, 2.0];
        assert_eq!(mean(&v), Some(2.0));
        assert_eq!(min(&v), Some(-1.0));
        assert_eq!(max(&v), Some(4.0));
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_std_dev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = std_dev(&v).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-8);
        assert!(std_dev(&[1.0]).is_none());
    }

    #[test]
    fn test_kahan_large_offset() {
        let mut v = vec![1.0e8];
        v.extend(std::iter::repeat(1.0e-8).take(10_000));
        let sum = KahanSum::sum_iter(v.iter().copied());
        assert!((sum - (1.0e8 + 1.0e-4)).abs() < 1e-7);
    }
}
