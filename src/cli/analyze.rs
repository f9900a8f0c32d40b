use std::io;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::results::{OutputFormat, analyze_result};

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeCommand {
    /// HDF5 结果文件路径
    pub path: PathBuf,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl AnalyzeCommand {
    /// 分析结果文件并输出到标准输出，返回是否成功
    pub fn analyze(&self) -> bool {
        analyze_result(&self.path, self.output_format, &mut io::stdout().lock())
    }
}

impl SubCommandExtend for AnalyzeCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        if !block_in_place(|| self.analyze()) {
            bail!("无法分析结果文件 {}", self.path.display());
        }
        Ok(())
    }
}
