// crates/mg_meteo/src/parameter.rs

//! 气象参数
//!
//! 点观测和二维场共用同一套参数标识。名称解析不区分大小写，
//! 规范名称为大写（如 `TA`、`PSUM_PH`）。

use mg_foundation::error::MgError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 气象参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeteoParam {
    /// 气温 [K]
    Ta,
    /// 相对湿度 [0-1]
    Rh,
    /// 露点温度 [K]
    Td,
    /// 比湿 [kg/kg]
    Qi,
    /// 风速 [m/s]
    Vw,
    /// 风向 [°]
    Dw,
    /// 最大风速 [m/s]
    VwMax,
    /// 东西向风分量 [m/s]
    U,
    /// 南北向风分量 [m/s]
    V,
    /// 垂直风分量 [m/s]
    W,
    /// 气压 [Pa]
    P,
    /// 总降水量 [mm]
    Psum,
    /// 固态降水量 [mm]
    PsumS,
    /// 液态降水量 [mm]
    PsumL,
    /// 降水相态比例 [0-1]，0 = 全固态，1 = 全液态
    PsumPh,
    /// 入射短波辐射 [W/m²]
    Iswr,
    /// 直射短波辐射 [W/m²]
    IswrDir,
    /// 散射短波辐射 [W/m²]
    IswrDiff,
    /// 反射短波辐射 [W/m²]
    Rswr,
    /// 反照率 [0-1]
    Alb,
    /// 入射长波辐射 [W/m²]
    Ilwr,
    /// 雪深 [m]
    Hs,
    /// 雪水当量 [mm]
    Swe,
    /// 雪密度 [kg/m³]
    Rsno,
    /// 雪面温度 [K]
    Tss,
    /// 地表温度 [K]
    Tsg,
}

impl MeteoParam {
    /// 全部参数
    pub const ALL: [MeteoParam; 26] = [
        Self::Ta,
        Self::Rh,
        Self::Td,
        Self::Qi,
        Self::Vw,
        Self::Dw,
        Self::VwMax,
        Self::U,
        Self::V,
        Self::W,
        Self::P,
        Self::Psum,
        Self::PsumS,
        Self::PsumL,
        Self::PsumPh,
        Self::Iswr,
        Self::IswrDir,
        Self::IswrDiff,
        Self::Rswr,
        Self::Alb,
        Self::Ilwr,
        Self::Hs,
        Self::Swe,
        Self::Rsno,
        Self::Tss,
        Self::Tsg,
    ];

    /// 规范名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Ta => "TA",
            Self::Rh => "RH",
            Self::Td => "TD",
            Self::Qi => "QI",
            Self::Vw => "VW",
            Self::Dw => "DW",
            Self::VwMax => "VW_MAX",
            Self::U => "U",
            Self::V => "V",
            Self::W => "W",
            Self::P => "P",
            Self::Psum => "PSUM",
            Self::PsumS => "PSUM_S",
            Self::PsumL => "PSUM_L",
            Self::PsumPh => "PSUM_PH",
            Self::Iswr => "ISWR",
            Self::IswrDir => "ISWR_DIR",
            Self::IswrDiff => "ISWR_DIFF",
            Self::Rswr => "RSWR",
            Self::Alb => "ALB",
            Self::Ilwr => "ILWR",
            Self::Hs => "HS",
            Self::Swe => "SWE",
            Self::Rsno => "RSNO",
            Self::Tss => "TSS",
            Self::Tsg => "TSG",
        }
    }

    /// 物理合理范围，插值结果会被截断到该范围内
    ///
    /// 返回 `None` 表示不做截断（例如温度、风向）。
    pub fn plausible_range(self) -> Option<(f64, f64)> {
        match self {
            Self::Rh => Some((0.01, 1.0)),
            Self::Alb => Some((0.01, 0.99)),
            Self::PsumPh => Some((0.0, 1.0)),
            Self::Qi
            | Self::Vw
            | Self::VwMax
            | Self::Psum
            | Self::PsumS
            | Self::PsumL
            | Self::Iswr
            | Self::IswrDir
            | Self::IswrDiff
            | Self::Rswr
            | Self::Ilwr
            | Self::Hs
            | Self::Swe
            | Self::Rsno
            | Self::P => Some((0.0, f64::INFINITY)),
            Self::Ta | Self::Td | Self::Dw | Self::U | Self::V | Self::W | Self::Tss | Self::Tsg => {
                None
            }
        }
    }
}

impl fmt::Display for MeteoParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeteoParam {
    type Err = MgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name() == upper)
            .ok_or_else(|| MgError::invalid_input(format!("未知的气象参数: {s}")))
    }
}
