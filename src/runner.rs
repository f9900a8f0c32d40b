use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, bail};
use log::info;

use crate::algorithm::{AnnAlgorithm, BatchResult};
use crate::dataset::Dataset;
use crate::results::{AttrValue, RECALLS, ResultWriter, TIMES};
use crate::stats::{self, recall_at_k};
use crate::utils::sanitize_file_name;

/// 一次基准测试的结果
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub algo: String,
    pub name: String,
    pub dataset: String,
    pub distance: String,
    pub k: usize,
    pub build_time: f64,
    pub runs: usize,
    /// 耗时最短的一轮查询
    pub best: BatchResult,
    /// 每个查询的召回率
    pub recalls: Vec<f64>,
}

impl BenchmarkResult {
    /// 最快一轮查询的平均单次耗时
    pub fn best_search_time(&self) -> f64 {
        stats::mean(&self.best.times).unwrap_or_default()
    }

    pub fn mean_recall(&self) -> f64 {
        stats::mean(&self.recalls).unwrap_or_default()
    }

    /// 结果文件路径：`<dir>/<dataset>/<k>/<algo>/<name>.hdf5`
    pub fn output_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref()
            .join(&self.dataset)
            .join(self.k.to_string())
            .join(&self.algo)
            .join(format!("{}.hdf5", sanitize_file_name(&self.name)))
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = ResultWriter::create(path)?;
        writer.write_values(TIMES, &self.best.times)?;
        writer.write_values(RECALLS, &self.recalls)?;
        writer.write_neighbors(&self.best.neighbors, self.k)?;

        let attrs = [
            ("algo", AttrValue::Text(self.algo.clone())),
            ("name", AttrValue::Text(self.name.clone())),
            ("dataset", AttrValue::Text(self.dataset.clone())),
            ("distance", AttrValue::Text(self.distance.clone())),
            ("count", AttrValue::Int(self.k as i64)),
            ("build_time", AttrValue::Float(self.build_time)),
            ("best_search_time", AttrValue::Float(self.best_search_time())),
            ("run_count", AttrValue::Int(self.runs as i64)),
            ("batch_mode", AttrValue::Bool(false)),
        ];
        for (name, value) in &attrs {
            writer.set_attr(name, value)?;
        }
        Ok(())
    }
}

/// 在数据集上运行算法：构建一次，查询 `runs` 轮并保留最快的一轮
pub async fn run_benchmark<A>(
    algo: &mut A,
    algo_name: &str,
    dataset: &Dataset,
    k: usize,
    runs: usize,
) -> Result<BenchmarkResult>
where
    A: AnnAlgorithm + Send,
{
    if k == 0 {
        bail!("k 必须大于 0");
    }
    if runs == 0 {
        bail!("查询轮数必须大于 0");
    }

    info!(
        "数据集 {}: {} 个训练向量，{} 个查询",
        dataset.name,
        dataset.train.nrows(),
        dataset.test.nrows()
    );
    let start = Instant::now();
    algo.fit(dataset.train.view()).await?;
    let build_time = start.elapsed().as_secs_f64();
    info!("构建完成，耗时 {build_time:.2}s");

    let mut best: Option<BatchResult> = None;
    for run in 1..=runs {
        info!("第 {run}/{runs} 轮查询");
        let result = algo.batch_query(dataset.test.view(), k).await?;
        if best.as_ref().is_none_or(|best| result.total < best.total) {
            best = Some(result);
        }
    }
    let best = best.unwrap_or_default();

    let recalls = best
        .neighbors
        .iter()
        .enumerate()
        .map(|(i, ids)| recall_at_k(&dataset.ground_truth(i, k), ids, k))
        .collect::<Vec<_>>();

    let result = BenchmarkResult {
        algo: algo_name.to_string(),
        name: algo.name(),
        dataset: dataset.name.clone(),
        distance: dataset.distance.clone(),
        k,
        build_time,
        runs,
        best,
        recalls,
    };
    info!("平均召回率: {:.4}", result.mean_recall());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ndarray::{Array2, ArrayView1, ArrayView2, array};
    use tempfile::TempDir;

    use super::*;
    use crate::results::ResultFile;

    /// 查表返回固定结果的算法
    struct Lookup {
        answers: HashMap<usize, Vec<i64>>,
        fitted: usize,
    }

    impl AnnAlgorithm for Lookup {
        async fn fit(&mut self, x: ArrayView2<'_, f32>) -> Result<()> {
            self.fitted = x.nrows();
            Ok(())
        }

        async fn query(&mut self, v: ArrayView1<'_, f32>, _k: usize) -> Result<Vec<i64>> {
            Ok(self.answers.get(&(v[0] as usize)).cloned().unwrap_or_default())
        }

        async fn batch_query(&mut self, x: ArrayView2<'_, f32>, k: usize) -> Result<BatchResult> {
            let mut result = BatchResult::default();
            for i in 0..x.nrows() {
                result.neighbors.push(self.query(x.row(i), k).await?);
                result.times.push(0.001);
            }
            result.total = std::time::Duration::from_millis(x.nrows() as u64);
            Ok(result)
        }

        fn name(&self) -> String {
            "Lookup(fixed)".to_string()
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            name: "tiny-1-euclidean".into(),
            distance: "euclidean".into(),
            train: Array2::zeros((5, 1)),
            test: array![[0f32], [1.]],
            neighbors: array![[1i64, 2], [3, 4]],
        }
    }

    #[tokio::test]
    async fn test_run_benchmark() {
        let answers = HashMap::from([(0, vec![1, 2]), (1, vec![4, 0])]);
        let mut algo = Lookup { answers, fitted: 0 };
        let result = run_benchmark(&mut algo, "lookup", &dataset(), 2, 3).await.unwrap();

        assert_eq!(algo.fitted, 5);
        assert_eq!(result.recalls, vec![1., 0.5]);
        assert!((result.mean_recall() - 0.75).abs() < 1e-12);
        assert!((result.best_search_time() - 0.001).abs() < 1e-12);
        assert_eq!(result.runs, 3);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let mut algo = Lookup { answers: HashMap::new(), fitted: 0 };
        assert!(run_benchmark(&mut algo, "lookup", &dataset(), 0, 1).await.is_err());
        assert!(run_benchmark(&mut algo, "lookup", &dataset(), 1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let answers = HashMap::from([(0, vec![1]), (1, vec![3])]);
        let mut algo = Lookup { answers, fitted: 0 };
        let result = run_benchmark(&mut algo, "lookup", &dataset(), 2, 1).await.unwrap();

        let dir = TempDir::new().unwrap();
        let path = result.output_path(dir.path());
        assert!(path.ends_with("tiny-1-euclidean/2/lookup/Lookup_fixed_.hdf5"));
        result.write(&path).unwrap();

        let file = ResultFile::open(&path).unwrap();
        assert_eq!(file.times, Some(vec![0.001, 0.001]));
        assert_eq!(file.recalls, Some(vec![0.5, 0.5]));
        assert_eq!(file.candidates, None);
        assert_eq!(file.attr("count"), Some(&AttrValue::Int(2)));
        assert_eq!(file.attr("algo"), Some(&AttrValue::Text("lookup".into())));
        assert_eq!(file.attr("batch_mode"), Some(&AttrValue::Bool(false)));
    }
}
