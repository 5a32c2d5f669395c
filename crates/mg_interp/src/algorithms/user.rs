// crates/mg_interp/src/algorithms/user.rs

//! `USER`：读取预先计算的栅格
//!
//! 栅格名为 `{subdir}{YYYY-MM-DDTHH.MM}_{PARAM}{ext}`，例如
//! `2024-01-20T12.00_TA.asc`。在 `initialize` 时就尝试读取，
//! 读到即评分 1，否则评分 0。

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::{MeteoParam, Timestamp};
use mg_terrain::{Grid2D, TerrainModel};
use std::sync::Arc;

use super::{fill_cells, AlgorithmArgs, AlgorithmContext, InterpolationAlgorithm};

/// 默认扩展名
pub const DEFAULT_EXTENSION: &str = ".asc";

/// 用户栅格的命名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGridNaming {
    /// 子目录，非空时以 `/` 结尾
    pub subdir: String,
    /// 扩展名
    pub ext: String,
}

impl Default for UserGridNaming {
    fn default() -> Self {
        Self {
            subdir: String::new(),
            ext: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl UserGridNaming {
    /// 解析 `subdir=`、`ext=`
    pub fn parse<S: AsRef<str>>(args: &[S]) -> MgResult<Self> {
        let mut args = AlgorithmArgs::parse(UserGrid::NAME, args)?;
        let mut subdir = args.string("subdir")?.unwrap_or_default();
        if !subdir.is_empty() && !subdir.ends_with('/') {
            subdir.push('/');
        }
        let ext = args
            .string("ext")?
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        args.finish()?;
        Ok(Self { subdir, ext })
    }

    /// 某参数、某时刻的栅格名
    pub fn grid_name(&self, param: MeteoParam, date: Timestamp) -> String {
        format!(
            "{}{}_{}{}",
            self.subdir,
            date.format("%Y-%m-%dT%H.%M"),
            param.name(),
            self.ext
        )
    }
}

/// 用户栅格
#[derive(Debug, Clone, Default)]
pub struct UserGrid {
    naming: UserGridNaming,
    name: String,
    grid: Option<Arc<Grid2D>>,
}

impl UserGrid {
    /// 算法名
    pub const NAME: &'static str = "USER";

    /// 创建算法实例
    pub fn new(naming: UserGridNaming) -> Self {
        Self {
            naming,
            ..Default::default()
        }
    }
}

impl InterpolationAlgorithm for UserGrid {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.name = self.naming.grid_name(param, ctx.date);
        self.grid = match ctx.grids {
            Some(grids) => match grids.read_named_grid(&self.name) {
                Ok(grid) => Some(grid),
                Err(e) => {
                    log::debug!("用户栅格 {} 不可用: {e}", self.name);
                    None
                }
            },
            None => None,
        };
    }

    fn quality_rating(&self) -> f64 {
        if self.grid.is_some() {
            1.0
        } else {
            0.0
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        let user = self.grid.as_ref().ok_or_else(|| {
            MgError::interpolation_failed(Self::NAME, format!("无法读取栅格 {}", self.name))
        })?;
        user.geometry().ensure_same(dem.geometry())?;
        fill_cells(dem, grid, |i, j, _| user.get(i, j));
        Ok(())
    }

    fn info(&self) -> String {
        self.name.clone()
    }
}
