// crates/mg_interp/src/registry.rs

//! 算法注册表
//!
//! 算法名（不区分大小写）与参数在配置加载时解析为 [`AlgorithmSpec`]，
//! 名称或参数错误此时立即报告；每次计算再由 `AlgorithmSpec` 创建新的算法实例。
//!
//! ```
//! use mg_interp::registry::{AlgorithmKind, AlgorithmRegistry};
//!
//! let registry = AlgorithmRegistry::new();
//! let spec = registry.resolve("idw_lapse", &["-0.0065", "soft"]).unwrap();
//! assert_eq!(spec.kind(), AlgorithmKind::IdwLapse);
//! assert!(registry.resolve("SPLINE", &[] as &[&str]).is_err());
//! ```

use mg_foundation::error::{MgError, MgResult};
use std::fmt;

use crate::algorithms::constant::{Average, NoneAlgorithm};
use crate::algorithms::humidity::RelativeHumidity;
use crate::algorithms::idw::Idw;
use crate::algorithms::kriging::OrdinaryKriging;
use crate::algorithms::lapse::{AvgLapse, IdwLapse, LapseSettings, LocalIdwLapse};
use crate::algorithms::snow::{split_base_args, PsumSnow};
use crate::algorithms::std_press::StandardPressure;
use crate::algorithms::user::{UserGrid, UserGridNaming};
use crate::algorithms::wind::WindCurvature;
use crate::algorithms::{AlgorithmArgs, InterpolationAlgorithm};
use crate::numerics::weighting::WeightKernel;

/// 已知算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlgorithmKind {
    /// 不填充
    None,
    /// 测站平均
    Avg,
    /// 标准大气气压
    StdPress,
    /// 海拔回归 + 平均残差
    AvgLapse,
    /// 反距离加权
    Idw,
    /// 海拔回归 + 残差 IDW
    IdwLapse,
    /// 局部海拔回归 + IDW
    LidwLapse,
    /// 露点法相对湿度
    Rh,
    /// 地形修正风场
    WindCurv,
    /// 地形再分配降水
    PsumSnow,
    /// 用户栅格
    User,
    /// 普通克里金
    OdKrig,
}

impl AlgorithmKind {
    /// 全部算法
    pub const ALL: [AlgorithmKind; 12] = [
        Self::None,
        Self::Avg,
        Self::StdPress,
        Self::AvgLapse,
        Self::Idw,
        Self::IdwLapse,
        Self::LidwLapse,
        Self::Rh,
        Self::WindCurv,
        Self::PsumSnow,
        Self::User,
        Self::OdKrig,
    ];

    /// 规范名称
    pub fn name(self) -> &'static str {
        match self {
            Self::None => NoneAlgorithm::NAME,
            Self::Avg => Average::NAME,
            Self::StdPress => StandardPressure::NAME,
            Self::AvgLapse => AvgLapse::NAME,
            Self::Idw => Idw::NAME,
            Self::IdwLapse => IdwLapse::NAME,
            Self::LidwLapse => LocalIdwLapse::NAME,
            Self::Rh => RelativeHumidity::NAME,
            Self::WindCurv => WindCurvature::NAME,
            Self::PsumSnow => PsumSnow::NAME,
            Self::User => UserGrid::NAME,
            Self::OdKrig => OrdinaryKriging::NAME,
        }
    }

    /// 按名称查找（不区分大小写）
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 已解析的算法参数
#[derive(Debug, Clone, PartialEq)]
enum Settings {
    Plain,
    StdPress { use_residuals: bool },
    Idw { kernel: WeightKernel },
    Lapse(LapseSettings),
    LocalLapse { settings: LapseSettings, neighbors: usize },
    PsumSnow { base: Box<AlgorithmSpec> },
    User(UserGridNaming),
}

/// 已校验的算法配置
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmSpec {
    kind: AlgorithmKind,
    settings: Settings,
}

impl AlgorithmSpec {
    /// 算法种类
    #[inline]
    pub fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    /// 算法名
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// 创建新的算法实例
    pub fn instantiate(&self) -> Box<dyn InterpolationAlgorithm> {
        match (&self.settings, self.kind) {
            (Settings::StdPress { use_residuals }, _) => Box::new(StandardPressure::new(*use_residuals)),
            (Settings::Idw { kernel }, _) => Box::new(Idw::new(*kernel)),
            (Settings::Lapse(s), AlgorithmKind::AvgLapse) => Box::new(AvgLapse::new(*s)),
            (Settings::Lapse(s), AlgorithmKind::Rh) => Box::new(RelativeHumidity::new(*s)),
            (Settings::Lapse(s), AlgorithmKind::WindCurv) => Box::new(WindCurvature::new(*s)),
            (Settings::Lapse(s), _) => Box::new(IdwLapse::new(*s)),
            (Settings::LocalLapse { settings, neighbors }, _) => {
                Box::new(LocalIdwLapse::new(*settings, *neighbors))
            }
            (Settings::PsumSnow { base }, _) => Box::new(PsumSnow::new(base.instantiate())),
            (Settings::User(naming), _) => Box::new(UserGrid::new(naming.clone())),
            (Settings::Plain, AlgorithmKind::Avg) => Box::new(Average::new()),
            (Settings::Plain, AlgorithmKind::OdKrig) => Box::new(OrdinaryKriging::default()),
            (Settings::Plain, _) => Box::new(NoneAlgorithm),
        }
    }
}

impl fmt::Display for AlgorithmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.settings {
            Settings::PsumSnow { base } => write!(f, "{}({})", self.kind, base),
            _ => write!(f, "{}", self.kind),
        }
    }
}

fn no_args<S: AsRef<str>>(algorithm: &'static str, args: &[S]) -> MgResult<()> {
    AlgorithmArgs::parse(algorithm, args)?.finish()
}

/// 算法注册表
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    kinds: Vec<AlgorithmKind>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmRegistry {
    /// 包含全部已知算法的注册表
    pub fn new() -> Self {
        Self {
            kinds: AlgorithmKind::ALL.to_vec(),
        }
    }

    /// 只包含指定算法的注册表
    pub fn with_kinds(kinds: impl IntoIterator<Item = AlgorithmKind>) -> Self {
        let mut kinds: Vec<_> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        Self { kinds }
    }

    /// 列出所有可用的算法
    pub fn available_algorithms(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|k| k.name()).collect()
    }

    /// 按名称查找
    pub fn kind(&self, name: &str) -> MgResult<AlgorithmKind> {
        AlgorithmKind::from_name(name)
            .filter(|k| self.kinds.contains(k))
            .ok_or_else(|| MgError::unknown_algorithm(name))
    }

    /// 校验名称并解析参数
    pub fn resolve<S: AsRef<str>>(&self, name: &str, args: &[S]) -> MgResult<AlgorithmSpec> {
        let kind = self.kind(name)?;
        let settings = match kind {
            AlgorithmKind::None | AlgorithmKind::Avg | AlgorithmKind::OdKrig => {
                no_args(kind.name(), args)?;
                Settings::Plain
            }
            AlgorithmKind::StdPress => Settings::StdPress {
                use_residuals: StandardPressure::parse_args(args)?,
            },
            AlgorithmKind::Idw => Settings::Idw {
                kernel: Idw::parse_args(args)?,
            },
            AlgorithmKind::AvgLapse
            | AlgorithmKind::IdwLapse
            | AlgorithmKind::Rh
            | AlgorithmKind::WindCurv => Settings::Lapse(LapseSettings::parse(kind.name(), args)?),
            AlgorithmKind::LidwLapse => {
                let (settings, neighbors) = LocalIdwLapse::parse_args(args)?;
                Settings::LocalLapse { settings, neighbors }
            }
            AlgorithmKind::PsumSnow => {
                let (base, rest) = split_base_args(args)?;
                let base = self.resolve(&base, rest.as_slice()).map_err(|e| match e {
                    MgError::UnknownAlgorithm { name } => {
                        MgError::invalid_argument(PsumSnow::NAME, format!("未知的基础算法 '{name}'"))
                    }
                    other => other,
                })?;
                Settings::PsumSnow {
                    base: Box::new(base),
                }
            }
            AlgorithmKind::User => Settings::User(UserGridNaming::parse(args)?),
        };
        Ok(AlgorithmSpec { kind, settings })
    }

    /// 按名称与参数创建算法实例
    pub fn get_algorithm<S: AsRef<str>>(
        &self,
        name: &str,
        args: &[S],
    ) -> MgResult<Box<dyn InterpolationAlgorithm>> {
        Ok(self.resolve(name, args)?.instantiate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ARGS: &[&str] = &[];

    #[test]
    fn test_names_roundtrip() {
        for kind in AlgorithmKind::ALL {
            assert_eq!(AlgorithmKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(AlgorithmKind::from_name("wind_curv"), Some(AlgorithmKind::WindCurv));
        assert_eq!(AlgorithmKind::from_name("CURV"), None);
    }

    #[test]
    fn test_instances_match_kind() {
        let registry = AlgorithmRegistry::new();
        for name in registry.available_algorithms() {
            let algo = registry.get_algorithm(name, NO_ARGS).unwrap();
            assert_eq!(algo.name(), name);
        }
    }

    #[test]
    fn test_unknown_vs_invalid() {
        let registry = AlgorithmRegistry::new();
        assert!(matches!(
            registry.resolve("KRIGING", NO_ARGS),
            Err(MgError::UnknownAlgorithm { .. })
        ));
        assert!(matches!(
            registry.resolve("AVG", &["3.0"]),
            Err(MgError::InvalidArgument { .. })
        ));
        assert!(matches!(
            registry.resolve("IDW_LAPSE", &["-0.006", "weird"]),
            Err(MgError::InvalidArgument { .. })
        ));
        // 已注册但未实现的算法在配置阶段是合法的
        assert!(registry.resolve("odkrig", NO_ARGS).is_ok());
    }

    #[test]
    fn test_psum_snow_base() {
        let registry = AlgorithmRegistry::new();
        let spec = registry.resolve("PSUM_SNOW", &["AVG_LAPSE", "0.0005", "frac"]).unwrap();
        assert_eq!(spec.to_string(), "PSUM_SNOW(AVG_LAPSE)");

        let spec = registry.resolve("PSUM_SNOW", NO_ARGS).unwrap();
        assert_eq!(spec.to_string(), "PSUM_SNOW(IDW_LAPSE)");

        assert!(matches!(
            registry.resolve("PSUM_SNOW", &["SPLINE"]),
            Err(MgError::InvalidArgument { .. })
        ));
        assert!(registry.resolve("PSUM_SNOW", &["base=PSUM_SNOW"]).is_err());
    }

    #[test]
    fn test_restricted_registry() {
        let registry = AlgorithmRegistry::with_kinds([AlgorithmKind::Idw, AlgorithmKind::Avg, AlgorithmKind::Idw]);
        assert_eq!(registry.available_algorithms(), vec!["AVG", "IDW"]);
        assert!(matches!(
            registry.resolve("IDW_LAPSE", NO_ARGS),
            Err(MgError::UnknownAlgorithm { .. })
        ));
    }
}
