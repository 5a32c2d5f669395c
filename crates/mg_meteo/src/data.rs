// crates/mg_meteo/src/data.rs

//! 测站与点观测

use mg_foundation::nodata;
use mg_geo::Coords;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::parameter::MeteoParam;
use crate::Timestamp;

/// 测站元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationData {
    /// 测站标识
    pub id: String,
    /// 测站名称
    #[serde(default)]
    pub name: String,
    /// 位置
    pub position: Coords,
    /// 测站所在坡面的坡度 [°]
    #[serde(default)]
    pub slope: Option<f64>,
    /// 测站所在坡面的坡向 [°]
    #[serde(default)]
    pub azimuth: Option<f64>,
}

impl StationData {
    /// 创建测站
    pub fn new(id: impl Into<String>, position: Coords) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            position,
            slope: None,
            azimuth: None,
        }
    }

    /// 附加坡度与坡向
    pub fn with_slope(mut self, slope: f64, azimuth: f64) -> Self {
        self.slope = Some(slope);
        self.azimuth = Some(azimuth);
        self
    }

    /// 海拔 [m]
    #[inline]
    pub fn altitude(&self) -> f64 {
        self.position.altitude
    }
}

/// 单个测站在某一时刻的观测
///
/// 缺测参数不出现在映射中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoData {
    /// 观测时间
    pub date: Timestamp,
    /// 测站
    pub station: StationData,
    values: BTreeMap<MeteoParam, f64>,
}

impl MeteoData {
    /// 创建空观测
    pub fn new(date: Timestamp, station: StationData) -> Self {
        Self {
            date,
            station,
            values: BTreeMap::new(),
        }
    }

    /// 链式设置观测值
    pub fn with(mut self, param: MeteoParam, value: f64) -> Self {
        self.set(param, Some(value));
        self
    }

    /// 读取参数值
    #[inline]
    pub fn get(&self, param: MeteoParam) -> Option<f64> {
        self.values.get(&param).copied()
    }

    /// 设置参数值，`None` 表示缺测
    pub fn set(&mut self, param: MeteoParam, value: Option<f64>) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                self.values.insert(param, v);
            }
            None => {
                self.values.remove(&param);
            }
        }
    }

    /// 从带哨兵值的原始值设置（外部接口）
    pub fn set_raw(&mut self, param: MeteoParam, raw: f64) {
        self.set(param, nodata::to_option(raw));
    }

    /// 导出为带哨兵值的原始值（外部接口）
    pub fn get_raw(&self, param: MeteoParam) -> f64 {
        nodata::from_option(self.get(param))
    }

    /// 已观测的参数
    pub fn params(&self) -> impl Iterator<Item = MeteoParam> + '_ {
        self.values.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> MeteoData {
        let date = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let station = StationData::new("WFJ", Coords::new(780_845.0, 189_237.0, 2540.0));
        MeteoData::new(date, station)
    }

    #[test]
    fn test_missing_values_absent() {
        let mut md = sample().with(MeteoParam::Ta, 268.15);
        md.set_raw(MeteoParam::Rh, -999.0);
        md.set(MeteoParam::Vw, Some(f64::NAN));
        assert_eq!(md.get(MeteoParam::Ta), Some(268.15));
        assert_eq!(md.get(MeteoParam::Rh), None);
        assert_eq!(md.get(MeteoParam::Vw), None);
        assert_eq!(md.get_raw(MeteoParam::Rh), -999.0);
        assert_eq!(md.params().collect::<Vec<_>>(), vec![MeteoParam::Ta]);
    }

    #[test]
    fn test_station_altitude() {
        let md = sample();
        assert_eq!(md.station.altitude(), 2540.0);
        assert_eq!(md.station.name, "WFJ");
    }
}
