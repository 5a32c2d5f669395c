// crates/mg_foundation/src/nodata.rs

//! 无数据值约定
//!
//! 引擎内部一律使用 `Option<f64>` 表示缺测；数值哨兵 [`NODATA`]
//! 只在与外部数据源交换栅格或站点数据时出现。

/// 外部接口使用的无数据哨兵值
pub const NODATA: f64 = -999.0;

/// 哨兵值比较容差
const NODATA_TOLERANCE: f64 = 1e-6;

/// 判断原始值是否表示缺测（哨兵值或非有限值）
#[inline]
pub fn is_nodata(value: f64) -> bool {
    !value.is_finite() || (value - NODATA).abs() < NODATA_TOLERANCE
}

/// 原始值转为可选值
#[inline]
pub fn to_option(value: f64) -> Option<f64> {
    if is_nodata(value) {
        None
    } else {
        Some(value)
    }
}

/// 可选值转为原始值
#[inline]
pub fn from_option(value: Option<f64>) -> f64 {
    value.unwrap_or(NODATA)
}

/// 批量转换原始数组
pub fn parse_slice(raw: &[f64]) -> Vec<Option<f64>> {
    raw.iter().map(|&v| to_option(v)).collect()
}

/// 批量导出为原始数组
pub fn export_slice(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().map(|&v| from_option(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_nodata() {
        assert!(is_nodata(NODATA));
        assert!(is_nodata(f64::NAN));
        assert!(is_nodata(f64::INFINITY));
        assert!(!is_nodata(0.0));
        assert!(!is_nodata(-998.5));
    }

    #[test]
    fn test_slice_conversion() {
        let raw = [1.0, NODATA, 3.5];
        let parsed = parse_slice(&raw);
        assert_eq!(parsed, vec![Some(1.0), None, Some(3.5)]);
        assert_eq!(export_slice(&parsed), raw.to_vec());
    }
}
