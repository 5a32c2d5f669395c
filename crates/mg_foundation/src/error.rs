// crates/mg_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `MgError` 枚举和 `MgResult` 类型别名，用于整个工作区的错误处理。
//!
//! # 错误分类
//!
//! 插值引擎的核心错误分为五类：
//!
//! - `UnknownAlgorithm`: 算法名不在注册表中（配置加载时立即报告）
//! - `InvalidArgument`: 算法参数个数或类型错误（构造时立即报告）
//! - `InterpolationFailed`: 计算时没有可用测站数据
//! - `NoData`: 请求的栅格/参数既不能读取也不能推导
//! - `NotImplemented`: 已注册但尚未实现的算法（调用时报告）
//!
//! 其余变体覆盖 IO、配置和几何一致性等通用错误。
//!
//! # 示例
//!
//! ```
//! use mg_foundation::error::{MgError, MgResult};
//!
//! fn lookup(name: &str) -> MgResult<()> {
//!     Err(MgError::unknown_algorithm(name))
//! }
//!
//! assert!(matches!(lookup("SPLINE"), Err(MgError::UnknownAlgorithm { .. })));
//! ```

use thiserror::Error;

/// 统一结果类型
pub type MgResult<T> = Result<T, MgError>;

/// MeteoGrid 错误类型
#[derive(Error, Debug)]
pub enum MgError {
    // ========================================================================
    // 插值引擎错误
    // ========================================================================
    /// 未知算法
    #[error("未知的插值算法: {name}")]
    UnknownAlgorithm {
        /// 请求的算法名
        name: String,
    },

    /// 算法参数无效
    #[error("算法 {algorithm} 的参数无效: {message}")]
    InvalidArgument {
        /// 算法名
        algorithm: String,
        /// 具体原因
        message: String,
    },

    /// 插值失败
    #[error("插值失败 ({algorithm}): {message}")]
    InterpolationFailed {
        /// 算法名
        algorithm: String,
        /// 具体原因
        message: String,
    },

    /// 无数据
    #[error("无可用数据: {what}")]
    NoData {
        /// 缺失的数据描述
        what: String,
    },

    /// 功能未实现
    #[error("功能未实现: {feature}")]
    NotImplemented {
        /// 未实现的功能描述
        feature: String,
    },

    // ========================================================================
    // 通用错误
    // ========================================================================
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 栅格几何不一致
    #[error("栅格几何不一致: {message}")]
    GeometryMismatch {
        /// 具体错误信息
        message: String,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl MgError {
    /// 未知算法
    pub fn unknown_algorithm(name: impl Into<String>) -> Self {
        Self::UnknownAlgorithm { name: name.into() }
    }

    /// 算法参数无效
    pub fn invalid_argument(algorithm: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            algorithm: algorithm.into(),
            message: message.into(),
        }
    }

    /// 插值失败
    pub fn interpolation_failed(algorithm: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InterpolationFailed {
            algorithm: algorithm.into(),
            message: message.into(),
        }
    }

    /// 无数据
    pub fn no_data(what: impl Into<String>) -> Self {
        Self::NoData { what: what.into() }
    }

    /// 功能未实现
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 几何不一致
    pub fn geometry_mismatch(message: impl Into<String>) -> Self {
        Self::GeometryMismatch {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 是否表示"数据不可用"
    ///
    /// 推导层把这两类错误视为依赖缺失而非硬错误。
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NoData { .. } | Self::NotImplemented { .. })
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl MgError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> MgResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> MgResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for MgError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MgError::unknown_algorithm("SPLINE");
        assert!(err.to_string().contains("SPLINE"));

        let err = MgError::interpolation_failed("IDW", "没有测站");
        assert!(err.to_string().contains("IDW"));
    }

    #[test]
    fn test_unknown_distinct_from_not_implemented() {
        let unknown = MgError::unknown_algorithm("FOO");
        let stub = MgError::not_implemented("ODKRIG");
        assert!(matches!(unknown, MgError::UnknownAlgorithm { .. }));
        assert!(matches!(stub, MgError::NotImplemented { .. }));
        assert!(!unknown.is_unavailable());
        assert!(stub.is_unavailable());
    }

    #[test]
    fn test_check_size() {
        assert!(MgError::check_size("test", 10, 10).is_ok());
        assert!(MgError::check_size("test", 10, 5).is_err());
    }

    #[test]
    fn test_check_index() {
        assert!(MgError::check_index("Cell", 5, 10).is_ok());
        assert!(MgError::check_index("Cell", 10, 10).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: MgError = io_err.into();
        assert!(matches!(err, MgError::Io { .. }));
    }
}
