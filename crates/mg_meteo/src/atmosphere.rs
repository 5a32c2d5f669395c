// crates/mg_meteo/src/atmosphere.rs

//! 大气物理换算
//!
//! - 标准大气气压（ICAO，位势高度修正）
//! - Magnus 饱和水汽压及其导出的露点、比湿换算
//! - 风速/风向与风分量互换
//!
//! 温度一律使用开尔文，相对湿度为 0-1 的比例。

use mg_geo::normalize_degrees;

/// 海平面标准气压 [Pa]
pub const STD_PRESSURE: f64 = 101_325.0;
/// 海平面标准温度 [K]
pub const STD_TEMPERATURE: f64 = 288.15;
/// 标准大气温度递减率 [K/m]
pub const STD_LAPSE_RATE: f64 = 0.0065;
/// 重力加速度 [m/s²]
pub const GRAVITY: f64 = 9.806_65;
/// 干空气气体常数 [J/(kg·K)]
pub const GAS_CONSTANT_DRY_AIR: f64 = 287.058;
/// 地球半径（位势高度换算）[m]
pub const EARTH_RADIUS: f64 = 6_356_766.0;
/// 水的冰点 [K]
pub const T_WATER_FREEZING: f64 = 273.15;
/// 水汽与干空气分子量比
pub const EPSILON: f64 = 0.622;

// Magnus 系数（液面）
const MAGNUS_A: f64 = 611.2;
const MAGNUS_B: f64 = 17.62;
const MAGNUS_C: f64 = 243.12;

/// 标准大气气压 [Pa]
///
/// ```
/// use mg_meteo::atmosphere::std_air_pressure;
/// assert!((std_air_pressure(0.0) - 101_325.0).abs() < 1e-6);
/// assert!((std_air_pressure(1000.0) - 89_876.0).abs() < 5.0);
/// ```
pub fn std_air_pressure(altitude: f64) -> f64 {
    let expo = GRAVITY / (STD_LAPSE_RATE * GAS_CONSTANT_DRY_AIR);
    let geopotential = EARTH_RADIUS * altitude / (EARTH_RADIUS + altitude);
    STD_PRESSURE * (1.0 - STD_LAPSE_RATE * geopotential / STD_TEMPERATURE).powf(expo)
}

/// 饱和水汽压 [Pa]
#[inline]
pub fn saturation_vapor_pressure(t: f64) -> f64 {
    let tc = t - T_WATER_FREEZING;
    MAGNUS_A * (MAGNUS_B * tc / (MAGNUS_C + tc)).exp()
}

/// 相对湿度转露点 [K]
///
/// `rh` 会被限制在 (0, 1] 内，避免对零取对数。
pub fn rh_to_dew_point(rh: f64, ta: f64) -> f64 {
    let rh = rh.clamp(1e-4, 1.0);
    let tc = ta - T_WATER_FREEZING;
    let gamma = rh.ln() + MAGNUS_B * tc / (MAGNUS_C + tc);
    MAGNUS_C * gamma / (MAGNUS_B - gamma) + T_WATER_FREEZING
}

/// 露点转相对湿度，结果不超过 1
pub fn dew_point_to_rh(td: f64, ta: f64) -> f64 {
    (saturation_vapor_pressure(td) / saturation_vapor_pressure(ta)).min(1.0)
}

/// 相对湿度转比湿 [kg/kg]，气压由海拔按标准大气估计
pub fn rh_to_specific_humidity(altitude: f64, ta: f64, rh: f64) -> f64 {
    let p = std_air_pressure(altitude);
    let e = rh * saturation_vapor_pressure(ta);
    EPSILON * e / (p - (1.0 - EPSILON) * e)
}

/// 比湿转相对湿度，结果不超过 1
pub fn specific_humidity_to_rh(altitude: f64, ta: f64, qi: f64) -> f64 {
    let p = std_air_pressure(altitude);
    let e = qi * p / (EPSILON + (1.0 - EPSILON) * qi);
    (e / saturation_vapor_pressure(ta)).min(1.0)
}

/// 由风分量计算风速 [m/s]
#[inline]
pub fn wind_speed(u: f64, v: f64) -> f64 {
    u.hypot(v)
}

/// 由风分量计算风向 [°]，atan2(U, V) 归一化到 [0, 360)
#[inline]
pub fn wind_direction(u: f64, v: f64) -> f64 {
    normalize_degrees(u.atan2(v).to_degrees())
}

/// 由风速与风向计算风分量 (U, V)
#[inline]
pub fn wind_components(speed: f64, direction: f64) -> (f64, f64) {
    let rad = direction.to_radians();
    (speed * rad.sin(), speed * rad.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_pressure_decreases_with_altitude() {
        let p0 = std_air_pressure(0.0);
        let p2000 = std_air_pressure(2000.0);
        assert!((p0 - STD_PRESSURE).abs() < 1e-9);
        assert!(p2000 < p0);
        assert!((p2000 - 79_495.0).abs() < 10.0);
    }

    #[test]
    fn test_dew_point_roundtrip() {
        let ta = 283.15;
        for rh in [0.2, 0.55, 0.9, 1.0] {
            let td = rh_to_dew_point(rh, ta);
            assert!(td <= ta + 1e-9);
            assert!((dew_point_to_rh(td, ta) - rh).abs() < 1e-9);
        }
    }

    #[test]
    fn test_saturated_dew_point_equals_temperature() {
        assert!((rh_to_dew_point(1.0, 270.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_specific_humidity_roundtrip() {
        let (alt, ta, rh) = (1500.0, 278.0, 0.7);
        let qi = rh_to_specific_humidity(alt, ta, rh);
        assert!(qi > 0.0 && qi < 0.02);
        assert!((specific_humidity_to_rh(alt, ta, qi) - rh).abs() < 1e-9);
    }

    #[test]
    fn test_wind_roundtrip() {
        let (u, v) = wind_components(10.0, 225.0);
        assert!((wind_speed(u, v) - 10.0).abs() < 1e-9);
        assert!((wind_direction(u, v) - 225.0).abs() < 1e-9);
        assert!((wind_direction(0.0, -1.0) - 180.0).abs() < 1e-9);
        assert!(wind_direction(0.0, 1.0).abs() < 1e-9);
    }

    /// 测试近北风的极小负分量不会产生 360°
    #[test]
    fn test_wind_direction_tiny_negative_u() {
        let dw = wind_direction(-1e-20, 5.0);
        assert!((0.0..360.0).contains(&dw), "dw = {dw}");
        assert_eq!(dw, 0.0);
    }
}
