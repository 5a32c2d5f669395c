// crates/mg_meteo/src/source.rs

//! 点观测数据提供者
//!
//! 真实的数据插件（文件、数据库、网络）在引擎之外实现此 trait；
//! [`MemoryObservations`] 用于嵌入式调用和测试。

use mg_foundation::error::MgResult;
use std::collections::BTreeMap;

use crate::data::MeteoData;
use crate::Timestamp;

/// 点观测数据提供者 trait
pub trait ObservationSource: Send + Sync {
    /// 获取某一时刻全部测站的观测
    ///
    /// 没有任何观测时返回空列表而不是错误。
    fn observations(&self, date: Timestamp) -> MgResult<Vec<MeteoData>>;
}

/// 内存观测数据集
#[derive(Debug, Clone, Default)]
pub struct MemoryObservations {
    by_date: BTreeMap<Timestamp, Vec<MeteoData>>,
}

impl MemoryObservations {
    /// 创建空数据集
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条观测
    pub fn push(&mut self, data: MeteoData) {
        self.by_date.entry(data.date).or_default().push(data);
    }

    /// 批量添加
    pub fn extend<I: IntoIterator<Item = MeteoData>>(&mut self, iter: I) {
        for data in iter {
            self.push(data);
        }
    }

    /// 观测时刻数量
    pub fn n_dates(&self) -> usize {
        self.by_date.len()
    }
}

impl FromIterator<MeteoData> for MemoryObservations {
    fn from_iter<I: IntoIterator<Item = MeteoData>>(iter: I) -> Self {
        let mut obs = Self::new();
        obs.extend(iter);
        obs
    }
}

impl ObservationSource for MemoryObservations {
    fn observations(&self, date: Timestamp) -> MgResult<Vec<MeteoData>> {
        Ok(self.by_date.get(&date).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StationData;
    use crate::parameter::MeteoParam;
    use chrono::TimeZone;
    use mg_geo::Coords;

    #[test]
    fn test_memory_observations_by_date() {
        let t0 = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let t1 = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap();
        let st = StationData::new("A", Coords::new(0.0, 0.0, 1000.0));

        let obs: MemoryObservations = vec![
            MeteoData::new(t0, st.clone()).with(MeteoParam::Ta, 270.0),
            MeteoData::new(t0, st.clone()).with(MeteoParam::Ta, 271.0),
            MeteoData::new(t1, st).with(MeteoParam::Ta, 272.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(obs.n_dates(), 2);
        assert_eq!(obs.observations(t0).unwrap().len(), 2);
        let t2 = chrono::Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        assert!(obs.observations(t2).unwrap().is_empty());
    }
}
