//! 几何类型定义
//!
//! 提供平面点 [`Point2D`] 和测站/栅格角点位置 [`Coords`]。
//!
//! 所有距离都在投影坐标（东向、北向，单位米）下计算，
//! 插值只使用水平距离，高程单独作为回归自变量。

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

// ============================================================================
// Point2D - 平面点
// ============================================================================

/// 平面点（投影坐标）
///
/// # 示例
///
/// ```
/// use mg_geo::geometry::Point2D;
///
/// let a = Point2D::new(0.0, 0.0);
/// let b = Point2D::new(3.0, 4.0);
/// assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// 东向坐标 [m]
    pub x: f64,
    /// 北向坐标 [m]
    pub y: f64,
}

impl Point2D {
    /// 零点常量
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// 创建新的2D点
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 计算到另一个点的欧几里得距离
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// 计算到另一个点的距离的平方
    #[inline]
    #[must_use]
    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl Add for Point2D {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

// ============================================================================
// Coords - 带高程的位置
// ============================================================================

/// 地理位置
///
/// 同时保存投影坐标、经纬度和海拔。经纬度只作为元数据携带，
/// 插值计算只读取 `easting`/`northing`/`altitude`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    /// 东向坐标 [m]
    pub easting: f64,
    /// 北向坐标 [m]
    pub northing: f64,
    /// 海拔 [m]
    pub altitude: f64,
    /// 纬度 [°]
    #[serde(default)]
    pub latitude: Option<f64>,
    /// 经度 [°]
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Coords {
    /// 由投影坐标和海拔创建
    #[must_use]
    pub const fn new(easting: f64, northing: f64, altitude: f64) -> Self {
        Self {
            easting,
            northing,
            altitude,
            latitude: None,
            longitude: None,
        }
    }

    /// 附加经纬度
    #[must_use]
    pub const fn with_lat_lon(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// 水平位置
    #[inline]
    #[must_use]
    pub const fn point(&self) -> Point2D {
        Point2D::new(self.easting, self.northing)
    }

    /// 水平距离
    #[inline]
    #[must_use]
    pub fn horizontal_distance(&self, other: &Self) -> f64 {
        self.point().distance_to(&other.point())
    }
}

// ============================================================================
// 方位角
// ============================================================================

/// 把方位角折算到 [0, 360)
///
/// `rem_euclid` 对极小的负角会舍入成正好 360，这里统一折回 0。
///
/// ```
/// use mg_geo::geometry::normalize_degrees;
/// assert_eq!(normalize_degrees(-90.0), 270.0);
/// assert_eq!(normalize_degrees(-1e-20), 0.0);
/// ```
#[inline]
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}
