//! 3×3 邻域差分算子
//!
//! ```text
//! 窗口编号（北在上，行号 j 向北递增）：
//!
//!   z1 z2 z3      (NW) (N) (NE)
//!   z4 z5 z6  →   (W)  (C) (E)
//!   z7 z8 z9      (SW) (S) (SE)
//! ```
//!
//! - 坡度/坡向：Horn (1981) 三阶加权差分
//! - 曲率：Liston & Elder (2006) 四方向曲率，供风场地形修正使用

use crate::grid::Grid2D;
use mg_geo::normalize_degrees;

/// 3×3 高程窗口
///
/// 缺测或越界的邻居用中心值代替，边缘单元因此退化为单侧差分。
#[derive(Debug, Clone, Copy)]
pub struct Window3x3 {
    /// 按 z1..z9 排列的高程
    pub z: [f64; 9],
}

impl Window3x3 {
    /// 从栅格取窗口，中心缺测时返回 `None`
    pub fn extract(grid: &Grid2D, i: usize, j: usize) -> Option<Self> {
        let center = grid.get(i, j)?;
        let ncols = grid.ncols() as isize;
        let nrows = grid.nrows() as isize;
        let fetch = |di: isize, dj: isize| -> f64 {
            let ii = i as isize + di;
            let jj = j as isize + dj;
            if ii < 0 || jj < 0 || ii >= ncols || jj >= nrows {
                return center;
            }
            grid.get(ii as usize, jj as usize).unwrap_or(center)
        };

        Some(Self {
            z: [
                fetch(-1, 1),
                fetch(0, 1),
                fetch(1, 1),
                fetch(-1, 0),
                center,
                fetch(1, 0),
                fetch(-1, -1),
                fetch(0, -1),
                fetch(1, -1),
            ],
        })
    }

    /// Horn 梯度 (∂z/∂x, ∂z/∂y)，x 向东、y 向北
    pub fn horn_gradient(&self, cellsize: f64) -> (f64, f64) {
        let [z1, z2, z3, z4, _, z6, z7, z8, z9] = self.z;
        let dzdx = ((z3 + 2.0 * z6 + z9) - (z1 + 2.0 * z4 + z7)) / (8.0 * cellsize);
        let dzdy = ((z1 + 2.0 * z2 + z3) - (z7 + 2.0 * z8 + z9)) / (8.0 * cellsize);
        (dzdx, dzdy)
    }

    /// Liston-Elder 曲率（未归一化）
    ///
    /// 正值表示凸起（山脊），负值表示凹陷（山谷）。
    pub fn liston_curvature(&self, cellsize: f64) -> f64 {
        let [z1, z2, z3, z4, z5, z6, z7, z8, z9] = self.z;
        let eta = cellsize;
        let diag = 2.0 * std::f64::consts::SQRT_2 * eta;
        0.25 * ((z5 - 0.5 * (z4 + z6)) / (2.0 * eta)
            + (z5 - 0.5 * (z2 + z8)) / (2.0 * eta)
            + (z5 - 0.5 * (z7 + z3)) / diag
            + (z5 - 0.5 * (z1 + z9)) / diag)
    }
}

/// 坡度 [°]
#[inline]
pub fn slope_degrees(dzdx: f64, dzdy: f64) -> f64 {
    (dzdx * dzdx + dzdy * dzdy).sqrt().atan().to_degrees()
}

/// 坡向 [°]，0 = 北，顺时针，指向下坡方向；平地为 0
#[inline]
pub fn aspect_degrees(dzdx: f64, dzdy: f64) -> f64 {
    if dzdx == 0.0 && dzdy == 0.0 {
        return 0.0;
    }
    normalize_degrees((-dzdx).atan2(-dzdy).to_degrees())
}
