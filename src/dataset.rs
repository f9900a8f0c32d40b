use std::path::Path;

use anyhow::{Context, Result, bail};
use hdf5::File;
use hdf5::types::VarLenUnicode;
use ndarray::Array2;

/// ann-benchmarks 格式的数据集
///
/// 文件中包含训练集 `train`、查询集 `test`、真实近邻 `neighbors`，以及度量属性 `distance`
#[derive(Debug, Clone)]
pub struct Dataset {
    /// 数据集名称，取自文件名，如 `glove-25-angular`
    pub name: String,
    /// 度量名称，如 `angular`、`euclidean`
    pub distance: String,
    pub train: Array2<f32>,
    pub test: Array2<f32>,
    pub neighbors: Array2<i64>,
}

impl Dataset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("无法打开数据集 {}", path.display()))?;

        let train = f.dataset("train")?.read_2d::<f32>().context("无法读取 train")?;
        let test = f.dataset("test")?.read_2d::<f32>().context("无法读取 test")?;
        let neighbors = f.dataset("neighbors")?.read_2d::<i64>().context("无法读取 neighbors")?;
        let distance = f
            .attr("distance")?
            .read_scalar::<VarLenUnicode>()
            .context("无法读取 distance 属性")?
            .as_str()
            .to_owned();

        if train.ncols() != test.ncols() {
            bail!("训练集维度 {} 与查询集维度 {} 不一致", train.ncols(), test.ncols());
        }
        if neighbors.nrows() != test.nrows() {
            bail!("真实近邻数量 {} 与查询数量 {} 不一致", neighbors.nrows(), test.nrows());
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());

        Ok(Self { name, distance, train, test, neighbors })
    }

    pub fn dimension(&self) -> usize {
        self.train.ncols()
    }

    /// 第 `i` 个查询的前 `k` 个真实近邻
    pub fn ground_truth(&self, i: usize, k: usize) -> Vec<i64> {
        self.neighbors.row(i).iter().take(k).copied().collect()
    }
}
