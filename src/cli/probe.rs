use anyhow::Result;
use clap::Parser;
use log::info;

use crate::cli::SubCommandExtend;
use crate::config::{MEMORY_DB, Opts};
use crate::db;

#[derive(Parser, Debug, Clone)]
pub struct ProbeCommand {}

impl SubCommandExtend for ProbeCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        db::probe_vector_support().await?;
        let mut conn = db::connect(MEMORY_DB).await?;
        let version = db::sqlite_version(&mut conn).await?;
        info!("libSQL 向量函数可用");
        println!("SQLite {version}: vector support available");
        Ok(())
    }
}
