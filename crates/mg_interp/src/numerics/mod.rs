// crates/mg_interp/src/numerics/mod.rs

//! 插值算法共用的数值工具
//!
//! - [`stats`]: Kahan 求和与基本统计量
//! - [`weighting`]: 反距离权重核与 IDW 插值器
//! - [`regression`]: 海拔线性回归与离群点剔除
//! - [`trend`]: 去趋势与恢复趋势

pub mod regression;
pub mod stats;
pub mod trend;
pub mod weighting;

pub use regression::{fit_with_rejection, linear_fit, LinearFit, RobustFit};
pub use trend::{Trend, TrendKind};
pub use weighting::{weighted_mean, IdwInterpolator, WeightKernel};
