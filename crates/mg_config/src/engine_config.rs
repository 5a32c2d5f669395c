// crates/mg_config/src/engine_config.rs

//! EngineConfig - 插值引擎配置
//!
//! 对每个气象参数给出按优先顺序排列的候选算法及其字符串参数。
//! 算法名和参数的语义由 `mg_interp` 的注册表解析，本层只负责
//! 读取、保存和结构性校验。
//!
//! ```json
//! {
//!   "interpolation": {
//!     "TA": [
//!       { "name": "IDW_LAPSE", "args": ["-0.0065", "soft"] },
//!       { "name": "AVG" }
//!     ]
//!   },
//!   "cache": { "max_grids": 10 },
//!   "failure_policy": "fail_loudly"
//! }
//! ```

use mg_meteo::MeteoParam;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

/// 单个候选算法
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmEntry {
    /// 算法名（不区分大小写）
    pub name: String,
    /// 有序字符串参数
    #[serde(default)]
    pub args: Vec<String>,
}

impl AlgorithmEntry {
    /// 无参数的候选算法
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// 带参数的候选算法
    pub fn with_args<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// 选中算法计算失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 直接返回错误
    #[default]
    FailLoudly,
    /// 依评分从高到低尝试下一个候选算法
    FallbackToNextBest,
}

/// 栅格缓存配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 最大缓存栅格数
    #[serde(default = "default_max_grids")]
    pub max_grids: usize,
}

fn default_max_grids() -> usize {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_grids: default_max_grids(),
        }
    }
}

/// 可用栅格清单的查询时间窗
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridWindowConfig {
    /// 请求时刻之前 [h]
    #[serde(default = "default_window")]
    pub window_before_hours: f64,
    /// 请求时刻之后 [h]
    #[serde(default = "default_window")]
    pub window_after_hours: f64,
}

/// 清单时间窗上限 [h]（十年）
pub const MAX_WINDOW_HOURS: f64 = 24.0 * 366.0 * 10.0;

fn default_window() -> f64 {
    48.0
}

impl Default for GridWindowConfig {
    fn default() -> Self {
        Self {
            window_before_hours: default_window(),
            window_after_hours: default_window(),
        }
    }
}

/// 插值引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 每个参数的候选算法（按优先顺序）
    #[serde(default)]
    pub interpolation: BTreeMap<MeteoParam, Vec<AlgorithmEntry>>,

    /// 栅格缓存
    #[serde(default)]
    pub cache: CacheConfig,

    /// 清单时间窗
    #[serde(default)]
    pub grids: GridWindowConfig,

    /// 失败策略
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// 是否把结果截断到参数的物理合理范围
    #[serde(default = "default_range_checks")]
    pub range_checks: bool,
}

fn default_range_checks() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut interpolation = BTreeMap::new();
        let mut add = |param: MeteoParam, entries: &[&str]| {
            interpolation.insert(
                param,
                entries.iter().map(|name| AlgorithmEntry::new(*name)).collect(),
            );
        };
        add(MeteoParam::Ta, &["IDW_LAPSE", "AVG_LAPSE", "AVG"]);
        add(MeteoParam::Td, &["IDW_LAPSE", "AVG_LAPSE", "AVG"]);
        add(MeteoParam::Rh, &["RH", "IDW_LAPSE", "AVG"]);
        add(MeteoParam::Vw, &["WIND_CURV", "IDW_LAPSE", "AVG"]);
        add(MeteoParam::Dw, &["WIND_CURV", "IDW", "AVG"]);
        add(MeteoParam::P, &["STD_PRESS"]);
        add(MeteoParam::Psum, &["PSUM_SNOW", "IDW", "AVG"]);
        add(MeteoParam::Iswr, &["IDW", "AVG"]);
        add(MeteoParam::Ilwr, &["AVG_LAPSE", "AVG"]);
        add(MeteoParam::Hs, &["IDW_LAPSE", "AVG"]);

        Self {
            interpolation,
            cache: CacheConfig::default(),
            grids: GridWindowConfig::default(),
            failure_policy: FailurePolicy::default(),
            range_checks: default_range_checks(),
        }
    }
}

impl EngineConfig {
    /// 空配置（无候选算法）
    pub fn empty() -> Self {
        Self {
            interpolation: BTreeMap::new(),
            ..Self::default()
        }
    }

    /// 参数的候选算法，未配置时为空
    pub fn candidates(&self, param: MeteoParam) -> &[AlgorithmEntry] {
        self.interpolation
            .get(&param)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 设置参数的候选算法
    pub fn set_candidates(&mut self, param: MeteoParam, entries: Vec<AlgorithmEntry>) {
        self.interpolation.insert(param, entries);
    }

    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析配置
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_grids == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cache.max_grids".to_string(),
                value: "0".to_string(),
                reason: "缓存容量必须为正".to_string(),
            });
        }

        for (key, value) in [
            ("grids.window_before_hours", self.grids.window_before_hours),
            ("grids.window_after_hours", self.grids.window_after_hours),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "时间窗不能为负".to_string(),
                });
            }
            if value > MAX_WINDOW_HOURS {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: format!("时间窗不能超过 {MAX_WINDOW_HOURS} 小时"),
                });
            }
        }

        for (param, entries) in &self.interpolation {
            if entries.is_empty() {
                return Err(ConfigError::Missing(format!("interpolation.{param}")));
            }
            if let Some(entry) = entries.iter().find(|e| e.name.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    key: format!("interpolation.{param}"),
                    value: format!("{:?}", entry.args),
                    reason: "算法名为空".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}
