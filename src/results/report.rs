use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;
use log::error;
use serde::Serialize;

use super::{AttrValue, RECALLS, ResultFile, TIMES};
use crate::stats::{LatencySummary, RecallSummary};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

/// 一个结果文件的统计摘要
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub file: String,
    pub times: Option<LatencySummary>,
    pub recalls: Option<RecallSummary>,
    pub candidates: Option<Vec<f64>>,
    pub metadata: BTreeMap<String, AttrValue>,
    pub keys: Vec<String>,
    /// 存在但没有任何数据的数据集
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub empty: Vec<String>,
}

impl Report {
    pub fn new(result: &ResultFile) -> Self {
        Self {
            file: result.file_name(),
            times: result.times.as_deref().and_then(LatencySummary::from_secs),
            recalls: result.recalls.as_deref().and_then(RecallSummary::from_values),
            candidates: result.candidates.clone(),
            metadata: result.attrs.iter().cloned().collect(),
            keys: result.keys.clone(),
            empty: [(TIMES, &result.times), (RECALLS, &result.recalls)]
                .into_iter()
                .filter(|(_, values)| values.as_ref().is_some_and(|v| v.is_empty()))
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }

    fn is_empty_dataset(&self, name: &str) -> bool {
        self.empty.iter().any(|n| n == name)
    }

    pub fn write_json(&self, out: &mut impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }

    pub fn write_table(&self, out: &mut impl Write) -> io::Result<()> {
        let heavy = "=".repeat(70);
        let light = "─".repeat(60);

        writeln!(out, "\n{heavy}")?;
        writeln!(out, "File: {}", self.file)?;
        writeln!(out, "{heavy}\n")?;

        match &self.times {
            Some(t) => {
                writeln!(out, "Query Performance:")?;
                writeln!(out, "  {light}")?;
                writeln!(out, "  Total queries:      {}", thousands(t.count))?;
                writeln!(out, "  QPS:                {:.2} queries/sec", t.qps)?;
                writeln!(out, "  Avg time:           {:.2} ms", t.mean * 1000.)?;
                writeln!(out, "  Median time:        {:.2} ms", t.median * 1000.)?;
                writeln!(out, "  Min time:           {:.2} ms", t.min * 1000.)?;
                writeln!(out, "  Max time:           {:.2} ms", t.max * 1000.)?;
                writeln!(out, "  Std dev:            {:.2} ms", t.std_dev * 1000.)?;
                writeln!(out, "  P95 time:           {:.2} ms", t.p95 * 1000.)?;
                writeln!(out, "  P99 time:           {:.2} ms", t.p99 * 1000.)?;
                writeln!(out)?;
            }
            None if self.is_empty_dataset(TIMES) => writeln!(out, "'times' data is empty\n")?,
            None => writeln!(out, "No 'times' data found\n")?,
        }

        match &self.recalls {
            Some(r) => {
                writeln!(out, "Accuracy (Recall):")?;
                writeln!(out, "  {light}")?;
                writeln!(out, "  Mean recall:        {:.6} ({:.4}%)", r.mean, r.mean * 100.)?;
                writeln!(out, "  Median recall:      {:.6} ({:.4}%)", r.median, r.median * 100.)?;
                writeln!(out, "  Min recall:         {:.6}", r.min)?;
                writeln!(out, "  Max recall:         {:.6}", r.max)?;
                writeln!(out)?;
            }
            None if self.is_empty_dataset(RECALLS) => {
                writeln!(out, "'recalls' data is empty\n")?
            }
            None => writeln!(out, "No 'recalls' data found\n")?,
        }

        if let Some(candidates) = &self.candidates {
            writeln!(out, "Search parameters:")?;
            writeln!(out, "  Candidates: {}", format_values(candidates))?;
            writeln!(out)?;
        }

        if !self.metadata.is_empty() {
            writeln!(out, "Metadata:")?;
            for (key, value) in &self.metadata {
                writeln!(out, "  {key}: {value}")?;
            }
            writeln!(out)?;
        }

        if self.keys.len() > 4 {
            writeln!(out, "Available data: {}", self.keys.join(", "))?;
            writeln!(out)?;
        }

        writeln!(out, "{heavy}\n")
    }
}

/// 分析结果文件并将报告写入 `out`，成功返回 `true`
///
/// 文件不存在或读取失败时写入错误信息并返回 `false`，不会向上传播错误
pub fn analyze_result(path: &Path, format: OutputFormat, out: &mut impl Write) -> bool {
    if !path.exists() {
        let _ = writeln!(out, "Error: File not found - {}", path.display());
        return false;
    }

    let result = ResultFile::open(path).and_then(|result| {
        let report = Report::new(&result);
        match format {
            OutputFormat::Json => report.write_json(out),
            OutputFormat::Table => Ok(report.write_table(out)?),
        }
    });

    match result {
        Ok(()) => true,
        Err(e) => {
            let _ = writeln!(out, "Error reading file: {e:#}");
            error!("{e:#}");
            print_backtrace(&e);
            false
        }
    }
}

/// 向标准错误输出调用栈，未开启 `RUST_BACKTRACE` 时强制捕获当前位置的调用栈
fn print_backtrace(e: &anyhow::Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "Stack backtrace:");
    if e.backtrace().status() == BacktraceStatus::Captured {
        let _ = writeln!(stderr, "{}", e.backtrace());
    } else {
        let _ = writeln!(stderr, "{}", Backtrace::force_capture());
    }
}

/// 按 numpy 的风格输出一维数组，整数值不带小数部分，如 `[10 20]`
fn format_values(values: &[f64]) -> String {
    let items = values
        .iter()
        .map(|v| if v.fract() == 0. { format!("{}", *v as i64) } else { v.to_string() })
        .collect::<Vec<_>>();
    format!("[{}]", items.join(" "))
}

/// 使用千位分隔符格式化整数，如 `10,000`
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut s = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            s.push(',');
        }
        s.push(c);
    }
    s
}
