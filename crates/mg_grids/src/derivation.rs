// crates/mg_grids/src/derivation.rs

//! 参数推导表
//!
//! 每条规则由若干输入参数计算一个目标参数，同一目标可以有多条规则，
//! 按表中顺序尝试。比湿相关规则还需要地形高程。

use mg_foundation::error::MgResult;
use mg_meteo::atmosphere;
use mg_meteo::MeteoParam;
use mg_terrain::Grid2D;

/// 推导计算函数：输入栅格按 `inputs` 顺序排列
pub type DeriveFn = fn(&[&Grid2D], Option<&Grid2D>) -> MgResult<Grid2D>;

/// 一条推导规则
#[derive(Clone, Copy)]
pub struct Derivation {
    /// 目标参数
    pub target: MeteoParam,
    /// 输入参数
    pub inputs: &'static [MeteoParam],
    /// 是否需要高程
    pub needs_elevation: bool,
    /// 计算函数
    pub compute: DeriveFn,
}

impl std::fmt::Debug for Derivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Derivation")
            .field("target", &self.target)
            .field("inputs", &self.inputs)
            .field("needs_elevation", &self.needs_elevation)
            .finish()
    }
}

use MeteoParam::*;

const fn rule(target: MeteoParam, inputs: &'static [MeteoParam], compute: DeriveFn) -> Derivation {
    Derivation {
        target,
        inputs,
        needs_elevation: false,
        compute,
    }
}

const fn rule_with_elevation(
    target: MeteoParam,
    inputs: &'static [MeteoParam],
    compute: DeriveFn,
) -> Derivation {
    Derivation {
        target,
        inputs,
        needs_elevation: true,
        compute,
    }
}

/// 全部推导规则
pub static DERIVATIONS: &[Derivation] = &[
    // 风
    rule(Vw, &[U, V], |g, _| g[0].zip_map(g[1], |u, v| Some(atmosphere::wind_speed(u, v)))),
    rule(Dw, &[U, V], |g, _| {
        g[0].zip_map(g[1], |u, v| Some(atmosphere::wind_direction(u, v)))
    }),
    rule(U, &[Vw, Dw], |g, _| {
        g[0].zip_map(g[1], |vw, dw| Some(atmosphere::wind_components(vw, dw).0))
    }),
    rule(V, &[Vw, Dw], |g, _| {
        g[0].zip_map(g[1], |vw, dw| Some(atmosphere::wind_components(vw, dw).1))
    }),
    // 湿度
    rule(Rh, &[Td, Ta], |g, _| {
        g[0].zip_map(g[1], |td, ta| Some(atmosphere::dew_point_to_rh(td, ta)))
    }),
    rule_with_elevation(Rh, &[Qi, Ta], |g, elev| match elev {
        Some(z) => g[0].zip3_map(g[1], z, |qi, ta, alt| {
            Some(atmosphere::specific_humidity_to_rh(alt, ta, qi))
        }),
        None => Err(mg_foundation::MgError::no_data("DEM")),
    }),
    rule(Td, &[Rh, Ta], |g, _| {
        g[0].zip_map(g[1], |rh, ta| Some(atmosphere::rh_to_dew_point(rh, ta)))
    }),
    rule_with_elevation(Qi, &[Rh, Ta], |g, elev| match elev {
        Some(z) => g[0].zip3_map(g[1], z, |rh, ta, alt| {
            Some(atmosphere::rh_to_specific_humidity(alt, ta, rh))
        }),
        None => Err(mg_foundation::MgError::no_data("DEM")),
    }),
    // 短波辐射
    rule(Iswr, &[IswrDir, IswrDiff], |g, _| g[0].zip_map(g[1], |a, b| Some(a + b))),
    rule(Iswr, &[Rswr, Alb], |g, _| g[0].zip_map(g[1], |r, a| ratio(r, a))),
    rule(IswrDir, &[Iswr, IswrDiff], |g, _| g[0].zip_map(g[1], |a, b| Some(a - b))),
    rule(IswrDiff, &[Iswr, IswrDir], |g, _| g[0].zip_map(g[1], |a, b| Some(a - b))),
    rule(Rswr, &[Iswr, Alb], |g, _| g[0].zip_map(g[1], |i, a| Some(i * a))),
    rule(Alb, &[Rswr, Iswr], |g, _| g[0].zip_map(g[1], |r, i| ratio(r, i))),
    // 积雪
    rule(Hs, &[Swe, Rsno], |g, _| g[0].zip_map(g[1], |swe, rho| ratio(swe, rho))),
    rule(Swe, &[Hs, Rsno], |g, _| g[0].zip_map(g[1], |hs, rho| Some(hs * rho))),
    // 降水
    rule(Psum, &[PsumS, PsumL], |g, _| g[0].zip_map(g[1], |s, l| Some(s + l))),
    rule(PsumPh, &[PsumL, Psum], |g, _| g[0].zip_map(g[1], |l, p| ratio(l, p))),
    rule(PsumL, &[Psum, PsumPh], |g, _| g[0].zip_map(g[1], |p, ph| Some(p * ph))),
    rule(PsumS, &[Psum, PsumPh], |g, _| g[0].zip_map(g[1], |p, ph| Some(p * (1.0 - ph)))),
];

/// 分母为零时结果缺测
#[inline]
fn ratio(num: f64, den: f64) -> Option<f64> {
    (den != 0.0).then(|| num / den)
}

/// 目标参数的推导规则
pub fn rules_for(target: MeteoParam) -> impl Iterator<Item = &'static Derivation> {
    DERIVATIONS.iter().filter(move |d| d.target == target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_geo::Coords;
    use mg_terrain::GridGeometry;

    fn grid(v: f64) -> Grid2D {
        Grid2D::new(GridGeometry::new(2, 1, 10.0, Coords::default()), Some(v))
    }

    fn apply(target: MeteoParam, inputs: &[f64]) -> Option<f64> {
        let grids: Vec<Grid2D> = inputs.iter().map(|&v| grid(v)).collect();
        let refs: Vec<&Grid2D> = grids.iter().collect();
        let rule = rules_for(target).next().unwrap();
        (rule.compute)(&refs, None).unwrap().get(0, 0)
    }

    #[test]
    fn test_every_rule_has_distinct_inputs() {
        for d in DERIVATIONS {
            assert!(!d.inputs.contains(&d.target), "{:?}", d);
        }
    }

    #[test]
    fn test_precipitation_phase() {
        assert_eq!(apply(PsumPh, &[3.0, 4.0]), Some(0.75));
        assert_eq!(apply(PsumPh, &[0.0, 0.0]), None);
        assert_eq!(apply(PsumS, &[4.0, 0.25]), Some(3.0));
    }

    #[test]
    fn test_snow_depth() {
        let hs = apply(Hs, &[300.0, 250.0]).unwrap();
        assert!((hs - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_specific_humidity_needs_elevation() {
        let rule = rules_for(Qi).next().unwrap();
        assert!(rule.needs_elevation);
        let (rh, ta) = (grid(0.5), grid(280.0));
        assert!((rule.compute)(&[&rh, &ta], None).is_err());
        let z = grid(1000.0);
        let qi = (rule.compute)(&[&rh, &ta], Some(&z)).unwrap();
        assert!(qi.get(1, 0).unwrap() > 0.0);
    }
}
