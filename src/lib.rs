pub mod algorithm;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod db;
pub mod libsql;
pub mod results;
pub mod runner;
pub mod stats;
pub mod utils;

pub use algorithm::{AnnAlgorithm, BatchResult};
pub use config::{Distance, LibSqlConfig, NeighborCompression, Opts};
pub use libsql::LibSql;
