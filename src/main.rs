use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use libsql_bench::Opts;
use libsql_bench::cli::SubCommandExtend;
use libsql_bench::config::SubCommand;
use log::error;
use tikv_jemallocator::Jemalloc;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    let result = match &opts.subcmd {
        SubCommand::Analyze(config) => config.run(&opts).await,
        SubCommand::Run(config) => config.run(&opts).await,
        SubCommand::Probe(config) => config.run(&opts).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}
