// crates/mg_interp/src/algorithms/idw.rs

//! `IDW`：测站值按水平距离反距离加权，不做海拔修正

use mg_foundation::error::{MgError, MgResult};
use mg_meteo::MeteoParam;
use mg_terrain::{Grid2D, TerrainModel};

use super::{fill_cells, gather, AlgorithmArgs, AlgorithmContext, InterpolationAlgorithm, Measurement};
use crate::numerics::weighting::{IdwInterpolator, WeightKernel};

/// 反距离加权
#[derive(Debug, Clone)]
pub struct Idw {
    kernel: WeightKernel,
    measurements: Vec<Measurement>,
    info: String,
}

impl Idw {
    /// 算法名
    pub const NAME: &'static str = "IDW";

    /// 创建算法实例
    pub fn new(kernel: WeightKernel) -> Self {
        Self {
            kernel,
            measurements: Vec::new(),
            info: String::new(),
        }
    }

    /// 解析 `kernel=`
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> MgResult<WeightKernel> {
        let mut args = AlgorithmArgs::parse(Self::NAME, args)?;
        let kernel = match args.string("kernel")? {
            Some(k) => k
                .parse()
                .map_err(|e: MgError| MgError::invalid_argument(Self::NAME, e.to_string()))?,
            None => WeightKernel::default(),
        };
        args.finish()?;
        Ok(kernel)
    }
}

/// 在 DEM 的每个有效单元上对测站值做 IDW
pub fn interpolate_idw(
    algorithm: &'static str,
    measurements: &[Measurement],
    kernel: WeightKernel,
    dem: &TerrainModel,
    grid: &mut Grid2D,
) -> MgResult<()> {
    if measurements.is_empty() {
        return Err(MgError::interpolation_failed(algorithm, "没有有效测站数据"));
    }
    let idw = IdwInterpolator::new(
        measurements.iter().map(Measurement::point).collect(),
        measurements.iter().map(|m| m.value).collect(),
    )?
    .with_kernel(kernel);

    let geometry = *dem.geometry();
    fill_cells(dem, grid, |i, j, _| idw.interpolate(&geometry.cell_center(i, j)));
    Ok(())
}

impl InterpolationAlgorithm for Idw {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, param: MeteoParam, ctx: &AlgorithmContext<'_>) {
        self.measurements = gather(param, ctx.observations);
    }

    fn quality_rating(&self) -> f64 {
        match self.measurements.len() {
            0 => 0.0,
            1 => 0.3,
            _ => 0.5,
        }
    }

    fn calculate(
        &mut self,
        dem: &TerrainModel,
        _ctx: &AlgorithmContext<'_>,
        grid: &mut Grid2D,
    ) -> MgResult<()> {
        interpolate_idw(Self::NAME, &self.measurements, self.kernel, dem, grid)?;
        self.info = format!("{} 站, 权重 {}", self.measurements.len(), self.kernel.name());
        Ok(())
    }

    fn info(&self) -> String {
        self.info.clone()
    }
}
