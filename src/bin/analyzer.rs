use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use env_logger::Env;
use libsql_bench::cli::AnalyzeCommand;
use libsql_bench::results::OutputFormat;

/// ANN-Benchmarks 结果分析工具
#[derive(Parser, Debug)]
#[command(name = "analyzer", version)]
struct Args {
    /// HDF5 结果文件路径
    path: Option<PathBuf>,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    output_format: OutputFormat,
}

fn print_usage() {
    let line = "=".repeat(70);
    println!("\n{line}");
    println!("ANN-Benchmarks Result Analyzer");
    println!("{line}");
    println!("\n{}", Args::command().render_usage());
    println!("\nExample:");
    println!(
        "  analyzer results/fashion-mnist-784-euclidean/10/libsql/\
         LibSQL_diskann-n32_l2_.hdf5"
    );
    println!();
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let Some(path) = args.path else {
        print_usage();
        return ExitCode::FAILURE;
    };

    let command = AnalyzeCommand { path, output_format: args.output_format };
    if command.analyze() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
