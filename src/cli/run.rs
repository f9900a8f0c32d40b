use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{AdapterOptions, Opts};
use crate::dataset::Dataset;
use crate::libsql::LibSql;
use crate::runner::run_benchmark;

#[derive(Parser, Debug, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub adapter: AdapterOptions,
    /// ann-benchmarks 格式的 HDF5 数据集路径
    pub dataset: PathBuf,
    /// 每个查询返回的近邻数量
    #[arg(short, value_name = "K", default_value_t = 10)]
    pub k: usize,
    /// 查询轮数，结果保留最快的一轮
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub runs: usize,
    /// 结果输出目录
    #[arg(short, long, value_name = "DIR", default_value = "results")]
    pub output: PathBuf,
}

impl SubCommandExtend for RunCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        let dataset = block_in_place(|| Dataset::open(&self.dataset))?;
        let config = self.adapter.to_config(&dataset.distance);
        info!("算法: {config}");

        let mut algo = LibSql::new(config).await?;
        let result = run_benchmark(&mut algo, "libsql", &dataset, self.k, self.runs).await?;
        algo.close().await?;

        let path = result.output_path(&self.output);
        block_in_place(|| result.write(&path))?;
        info!("结果已保存到 {}", path.display());
        Ok(())
    }
}
