// crates/mg_interp/src/algorithms/args.rs

//! 算法参数解析
//!
//! 每个参数要么是裸词，要么是 `key=value`：
//!
//! - 裸数字按顺序作为位置参数（如递减率）
//! - 其它裸词视为开关（如 `soft`、`frac`）
//! - 键名不区分大小写
//!
//! 算法按需取走参数，最后调用 [`AlgorithmArgs::finish`]，
//! 剩余未识别的参数一律报 `InvalidArgument`。

use mg_foundation::error::{MgError, MgResult};
use std::collections::{BTreeMap, VecDeque};

/// 已切分的算法参数
#[derive(Debug, Clone)]
pub struct AlgorithmArgs {
    algorithm: &'static str,
    positional: VecDeque<f64>,
    keyed: BTreeMap<String, Option<String>>,
}

impl AlgorithmArgs {
    /// 切分参数
    pub fn parse<S: AsRef<str>>(algorithm: &'static str, args: &[S]) -> MgResult<Self> {
        let mut positional = VecDeque::new();
        let mut keyed = BTreeMap::new();

        for raw in args {
            let token = raw.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            if let Some((key, value)) = token.split_once('=') {
                let key = key.trim().to_ascii_lowercase();
                if key.is_empty() {
                    return Err(MgError::invalid_argument(algorithm, format!("缺少键名: '{token}'")));
                }
                if keyed.insert(key.clone(), Some(value.trim().to_string())).is_some() {
                    return Err(MgError::invalid_argument(algorithm, format!("重复的参数 '{key}'")));
                }
            } else if let Ok(v) = token.parse::<f64>() {
                if !v.is_finite() {
                    return Err(MgError::invalid_argument(algorithm, format!("无效的数值 '{token}'")));
                }
                positional.push_back(v);
            } else {
                keyed.insert(token.to_ascii_lowercase(), None);
            }
        }

        Ok(Self {
            algorithm,
            positional,
            keyed,
        })
    }

    /// 所属算法
    #[inline]
    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    fn invalid(&self, message: impl Into<String>) -> MgError {
        MgError::invalid_argument(self.algorithm, message)
    }

    /// 取走下一个位置参数
    pub fn next_positional(&mut self) -> Option<f64> {
        self.positional.pop_front()
    }

    /// 取走开关，`key` 或 `key=true|false`
    pub fn flag(&mut self, key: &str) -> MgResult<bool> {
        match self.keyed.remove(key) {
            None => Ok(false),
            Some(None) => Ok(true),
            Some(Some(v)) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(self.invalid(format!("开关 '{key}' 的取值无效: '{v}'"))),
            },
        }
    }

    /// 取走 `key=value` 形式的字符串
    pub fn string(&mut self, key: &str) -> MgResult<Option<String>> {
        match self.keyed.remove(key) {
            None => Ok(None),
            Some(Some(v)) => Ok(Some(v)),
            Some(None) => Err(self.invalid(format!("参数 '{key}' 缺少取值"))),
        }
    }

    /// 取走 `key=value` 形式的数值
    pub fn number(&mut self, key: &str) -> MgResult<Option<f64>> {
        match self.string(key)? {
            None => Ok(None),
            Some(v) => match v.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Some(x)),
                _ => Err(self.invalid(format!("参数 '{key}' 不是有效数值: '{v}'"))),
            },
        }
    }

    /// 取走数值参数：优先 `key=value`，否则下一个位置参数
    pub fn number_or_positional(&mut self, key: &str) -> MgResult<Option<f64>> {
        match self.number(key)? {
            Some(v) => Ok(Some(v)),
            None => Ok(self.next_positional()),
        }
    }

    /// 把数值转换为正整数
    pub fn to_count(&self, key: &str, value: f64, min: usize) -> MgResult<usize> {
        if value.fract() != 0.0 || value < min as f64 {
            return Err(self.invalid(format!("'{key}' 必须是不小于 {min} 的整数，实际为 {value}")));
        }
        Ok(value as usize)
    }

    /// 检查没有剩余参数
    pub fn finish(self) -> MgResult<()> {
        if let Some(v) = self.positional.front() {
            return Err(self.invalid(format!("多余的位置参数 {v}")));
        }
        if let Some(key) = self.keyed.keys().next() {
            return Err(self.invalid(format!("未知参数 '{key}'")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_and_flags() {
        let mut args = AlgorithmArgs::parse("IDW_LAPSE", &["-0.008", "SOFT", "kernel=inv"]).unwrap();
        assert_eq!(args.number_or_positional("rate").unwrap(), Some(-0.008));
        assert!(args.flag("soft").unwrap());
        assert!(!args.flag("frac").unwrap());
        assert_eq!(args.string("kernel").unwrap().as_deref(), Some("inv"));
        assert!(args.finish().is_ok());
    }

    #[test]
    fn test_keyword_rate_wins() {
        let mut args = AlgorithmArgs::parse("AVG_LAPSE", &["rate=0.5"]).unwrap();
        assert_eq!(args.number_or_positional("rate").unwrap(), Some(0.5));
        assert!(args.finish().is_ok());
    }

    #[test]
    fn test_leftovers_rejected() {
        let args = AlgorithmArgs::parse("AVG", &["1.0"]).unwrap();
        assert!(matches!(args.finish(), Err(MgError::InvalidArgument { .. })));

        let args = AlgorithmArgs::parse("AVG", &["bogus"]).unwrap();
        assert!(matches!(args.finish(), Err(MgError::InvalidArgument { .. })));
    }

    #[test]
    fn test_malformed_values() {
        let mut args = AlgorithmArgs::parse("IDW_LAPSE", &["rate=abc"]).unwrap();
        assert!(args.number("rate").is_err());

        assert!(AlgorithmArgs::parse("IDW_LAPSE", &["rate=1", "rate=2"]).is_err());

        let args = AlgorithmArgs::parse("LIDW_LAPSE", &["2.5"]).unwrap();
        assert!(args.to_count("neighbors", 2.5, 2).is_err());
        assert_eq!(args.to_count("neighbors", 4.0, 2).unwrap(), 4);
    }
}
