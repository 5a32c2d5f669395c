// crates/mg_grids/tests/derivation.rs

//! 参数推导测试
//! 验证由相关参数合成缺失栅格的路径、缓存与循环截断

use chrono::TimeZone;
use mg_foundation::MgError;
use mg_geo::Coords;
use mg_grids::{CacheKey, GridManager, MemoryGridSource};
use mg_meteo::atmosphere;
use mg_meteo::{MeteoParam, Timestamp};
use mg_terrain::{Grid2D, GridGeometry, TerrainModel};
use std::sync::Arc;

fn geometry() -> GridGeometry {
    GridGeometry::new(4, 3, 250.0, Coords::new(600_000.0, 150_000.0, 0.0))
}

fn date() -> Timestamp {
    chrono::Utc.with_ymd_and_hms(2024, 2, 14, 6, 0, 0).unwrap()
}

fn constant(v: f64) -> Grid2D {
    Grid2D::new(geometry(), Some(v))
}

/// 测试由风分量推导风速风向
#[test]
fn test_wind_from_components() {
    let source = MemoryGridSource::new();
    source.insert_grid(MeteoParam::U, date(), constant(3.0));
    source.insert_grid(MeteoParam::V, date(), constant(4.0));
    let manager = GridManager::new(Arc::new(source), 10);

    let vw = manager.resolve(MeteoParam::Vw, date()).unwrap();
    let dw = manager.resolve(MeteoParam::Dw, date()).unwrap();
    for v in vw.values() {
        assert!((v.unwrap() - 5.0).abs() < 1e-9);
    }
    let expected = 3.0_f64.atan2(4.0).to_degrees();
    assert!((dw.get(2, 1).unwrap() - expected).abs() < 1e-9);

    // 推导结果已缓存
    assert!(manager.cache().contains(&CacheKey::param(MeteoParam::Vw, date())));
}

/// 测试风向归一化到 [0, 360)
#[test]
fn test_wind_direction_normalized() {
    let source = MemoryGridSource::new();
    source.insert_grid(MeteoParam::U, date(), constant(-1.0));
    source.insert_grid(MeteoParam::V, date(), constant(0.0));
    let manager = GridManager::new(Arc::new(source), 10);

    let dw = manager.resolve(MeteoParam::Dw, date()).unwrap();
    assert!((dw.get(0, 0).unwrap() - 270.0).abs() < 1e-9);
}

/// 测试极小负 U 分量推导出的风向仍在 [0, 360)
#[test]
fn test_wind_direction_tiny_negative_component() {
    let source = MemoryGridSource::new();
    source.insert_grid(MeteoParam::U, date(), constant(-1e-20));
    source.insert_grid(MeteoParam::V, date(), constant(5.0));
    let manager = GridManager::new(Arc::new(source), 10);

    let dw = manager.resolve(MeteoParam::Dw, date()).unwrap();
    for v in dw.values() {
        let d = v.unwrap();
        assert!((0.0..360.0).contains(&d), "DW = {d}");
    }
}

/// 测试 RH 由露点推导，且露点不会反过来要求 RH
#[test]
fn test_humidity_from_dew_point() {
    let source = MemoryGridSource::new();
    source.insert_grid(MeteoParam::Ta, date(), constant(280.0));
    source.insert_grid(MeteoParam::Td, date(), constant(275.0));
    let manager = GridManager::new(Arc::new(source), 10);

    let rh = manager.resolve(MeteoParam::Rh, date()).unwrap();
    let expected = atmosphere::dew_point_to_rh(275.0, 280.0);
    assert!((rh.get(3, 2).unwrap() - expected).abs() < 1e-12);
    assert!(expected < 1.0);
}

/// 测试比湿推导需要地形高程
#[test]
fn test_specific_humidity_uses_dem() {
    let source = Arc::new(MemoryGridSource::new());
    source.insert_grid(MeteoParam::Ta, date(), constant(270.0));
    source.insert_grid(MeteoParam::Rh, date(), constant(0.8));
    let manager = GridManager::new(source, 10);

    assert!(matches!(
        manager.resolve(MeteoParam::Qi, date()),
        Err(MgError::NoData { .. })
    ));

    manager
        .set_dem(Arc::new(TerrainModel::new(constant(1800.0))))
        .unwrap();
    let qi = manager.resolve(MeteoParam::Qi, date()).unwrap();
    let expected = atmosphere::rh_to_specific_humidity(1800.0, 270.0, 0.8);
    assert!((qi.get(1, 1).unwrap() - expected).abs() < 1e-12);
}

/// 测试降水相态在总量为零处缺测
#[test]
fn test_phase_missing_where_no_precipitation() {
    let source = MemoryGridSource::new();
    let mut solid = constant(2.0);
    let mut liquid = constant(2.0);
    solid.set(0, 0, Some(0.0));
    liquid.set(0, 0, Some(0.0));
    source.insert_grid(MeteoParam::PsumS, date(), solid);
    source.insert_grid(MeteoParam::PsumL, date(), liquid);
    let manager = GridManager::new(Arc::new(source), 10);

    let ph = manager.resolve(MeteoParam::PsumPh, date()).unwrap();
    assert_eq!(ph.get(0, 0), None);
    assert_eq!(ph.get(1, 0), Some(0.5));
}

/// 测试互相依赖的参数不会无限递归
#[test]
fn test_cycle_terminates_with_no_data() {
    let source = MemoryGridSource::new();
    source.insert_grid(MeteoParam::Rsno, date(), constant(300.0));
    let manager = GridManager::new(Arc::new(source), 10);

    let err = manager.resolve(MeteoParam::Hs, date()).unwrap_err();
    assert!(matches!(err, MgError::NoData { .. }));
}

/// 测试几何不一致的源栅格被视为不可用
#[test]
fn test_mismatched_source_grid_ignored() {
    let source = Arc::new(MemoryGridSource::new());
    let other = GridGeometry::new(2, 2, 250.0, Coords::default());
    source.insert_grid(MeteoParam::Ta, date(), Grid2D::new(other, Some(260.0)));
    let manager = GridManager::new(source, 10);
    manager
        .set_dem(Arc::new(TerrainModel::new(constant(900.0))))
        .unwrap();

    assert!(manager.resolve(MeteoParam::Ta, date()).is_err());
}

/// 测试缓存条目数不超过上限
#[test]
fn test_cache_bounded() {
    let source = MemoryGridSource::new();
    for h in 0..6 {
        let d = date() + chrono::Duration::hours(h);
        source.insert_grid(MeteoParam::Ta, d, constant(270.0 + h as f64));
    }
    let manager = GridManager::new(Arc::new(source), 3);

    for h in 0..6 {
        let d = date() + chrono::Duration::hours(h);
        let grid = manager.resolve(MeteoParam::Ta, d).unwrap();
        assert_eq!(grid.get(0, 0), Some(270.0 + h as f64));
        assert!(manager.cache().len() <= 3);
    }
}
