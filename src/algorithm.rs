use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use ndarray::{ArrayView1, ArrayView2};

use crate::stats::LatencySummary;

/// 一组查询的结果
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// 每个查询返回的近邻 ID
    pub neighbors: Vec<Vec<i64>>,
    /// 每个查询的耗时（秒）
    pub times: Vec<f64>,
    /// 整组查询的总耗时
    pub total: Duration,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// 按总耗时计算的吞吐量
    pub fn qps(&self) -> f64 {
        self.len() as f64 / self.total.as_secs_f64()
    }

    pub fn latency(&self) -> Option<LatencySummary> {
        LatencySummary::from_secs(&self.times)
    }
}

/// 基准测试驱动调用的近似最近邻算法接口
pub trait AnnAlgorithm {
    /// 使用训练集构建数据，每一行是一个向量，行号即向量 ID
    fn fit(&mut self, x: ArrayView2<'_, f32>) -> impl Future<Output = Result<()>> + Send;

    /// 查询与 `v` 最接近的 `k` 个向量，返回的 ID 数量不超过 `k`
    fn query(&mut self, v: ArrayView1<'_, f32>, k: usize)
    -> impl Future<Output = Result<Vec<i64>>> + Send;

    /// 依次查询 `x` 中的每一行
    fn batch_query(
        &mut self,
        x: ArrayView2<'_, f32>,
        k: usize,
    ) -> impl Future<Output = Result<BatchResult>> + Send;

    /// 算法名称，同时用作结果文件名
    fn name(&self) -> String;
}
