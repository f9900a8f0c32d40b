//! 基准测试结果的描述性统计
//!
//! 百分位数使用与 numpy 默认行为一致的线性插值，标准差为总体标准差（ddof = 0）。

use std::collections::HashSet;

use ndarray::ArrayView1;
use serde::Serialize;

/// 算术平均值，空输入返回 `None`
pub fn mean(values: &[f64]) -> Option<f64> {
    ArrayView1::from(values).mean()
}

/// 总体标准差，空输入返回 `None`
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(ArrayView1::from(values).std(0.))
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.)
}

/// 计算第 `q` 百分位数，`q` 的范围为 0 ~ 100
///
/// 在排序后的第 `q / 100 * (n - 1)` 个位置上，对相邻两个值进行线性插值
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = q.clamp(0., 100.) / 100. * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// 查询延迟统计，所有时间单位均为秒
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    /// 按平均延迟换算的每秒查询数
    pub qps: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencySummary {
    pub fn from_secs(times: &[f64]) -> Option<Self> {
        let mut sorted = times.to_vec();
        sorted.sort_unstable_by(f64::total_cmp);

        let mean = mean(&sorted)?;
        Some(Self {
            count: sorted.len(),
            qps: 1. / mean,
            mean,
            median: percentile_sorted(&sorted, 50.)?,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            std_dev: std_dev(&sorted)?,
            p95: percentile_sorted(&sorted, 95.)?,
            p99: percentile_sorted(&sorted, 99.)?,
        })
    }
}

/// 召回率统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl RecallSummary {
    pub fn from_values(recalls: &[f64]) -> Option<Self> {
        Some(Self {
            count: recalls.len(),
            mean: mean(recalls)?,
            median: median(recalls)?,
            min: min(recalls)?,
            max: max(recalls)?,
        })
    }
}

/// recall@k：前 k 个真实近邻中被找回的比例
pub fn recall_at_k(ground_truth: &[i64], retrieved: &[i64], k: usize) -> f64 {
    if k == 0 || ground_truth.is_empty() {
        return 0.;
    }
    let truth = ground_truth.iter().take(k).collect::<HashSet<_>>();
    let hits = retrieved.iter().take(k).collect::<HashSet<_>>().intersection(&truth).count();
    hits as f64 / k as f64
}
