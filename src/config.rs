use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::cli::*;

/// 内存数据库路径
pub const MEMORY_DB: &str = ":memory:";

#[derive(Parser, Debug, Clone)]
#[command(name = "libsql-bench", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 分析 ann-benchmarks 生成的 HDF5 结果文件
    Analyze(AnalyzeCommand),
    /// 使用 libSQL 向量扩展运行一次基准测试
    Run(RunCommand),
    /// 检查当前链接的 SQLite 是否支持 libSQL 向量函数
    Probe(ProbeCommand),
}

/// 向量距离函数
#[derive(ValueEnum, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Cosine,
    L2,
}

impl Distance {
    /// 根据数据集的度量名称选择距离函数，angular 对应余弦距离，其余均为 L2
    pub fn for_metric(metric: &str) -> Self {
        match metric {
            "angular" => Self::Cosine,
            _ => Self::L2,
        }
    }

    /// 暴力搜索时使用的 SQL 距离函数
    pub fn sql_function(self) -> &'static str {
        match self {
            Self::Cosine => "vector_distance_cos",
            Self::L2 => "vector_distance_l2",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::L2 => "l2",
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DiskANN 索引中邻居向量的压缩方式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborCompression {
    Float1bit,
    Float8,
    Float16,
    Floatb16,
    Float32,
}

impl NeighborCompression {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float1bit => "float1bit",
            Self::Float8 => "float8",
            Self::Float16 => "float16",
            Self::Floatb16 => "floatb16",
            Self::Float32 => "float32",
        }
    }
}

impl fmt::Display for NeighborCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// libSQL 适配器的命令行参数
#[derive(Parser, Debug, Clone)]
pub struct AdapterOptions {
    /// 不创建向量索引，使用全表扫描进行精确搜索
    #[arg(long)]
    pub no_index: bool,
    /// 索引中每个节点的最大邻居数量，不指定则使用 libSQL 的默认值
    #[arg(long, value_name = "N")]
    pub max_neighbors: Option<u32>,
    /// 索引中邻居向量的压缩方式，不指定则使用 libSQL 的默认值
    #[arg(long, value_enum, value_name = "TYPE")]
    pub compress_neighbors: Option<NeighborCompression>,
    /// 强制指定距离函数，默认根据数据集的度量自动选择
    #[arg(long, value_enum, value_name = "DISTANCE")]
    pub distance_metric: Option<Distance>,
    /// 数据库文件路径
    #[arg(long, value_name = "PATH", default_value = MEMORY_DB)]
    pub db_path: PathBuf,
}

impl AdapterOptions {
    pub fn to_config(&self, metric: &str) -> LibSqlConfig {
        let mut config = LibSqlConfig::new(metric)
            .use_index(!self.no_index)
            .db_path(self.db_path.clone());
        config.max_neighbors = self.max_neighbors;
        config.compress_neighbors = self.compress_neighbors;
        config.distance_metric = self.distance_metric;
        config
    }
}

/// libSQL 适配器配置
#[derive(Debug, Clone)]
pub struct LibSqlConfig {
    /// 基准测试使用的度量名称，如 angular、euclidean
    pub metric: String,
    pub use_index: bool,
    pub max_neighbors: Option<u32>,
    pub compress_neighbors: Option<NeighborCompression>,
    /// 显式指定的距离函数，优先于 `metric`
    pub distance_metric: Option<Distance>,
    pub db_path: PathBuf,
}

impl LibSqlConfig {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            use_index: true,
            max_neighbors: None,
            compress_neighbors: None,
            distance_metric: None,
            db_path: PathBuf::from(MEMORY_DB),
        }
    }

    pub fn use_index(mut self, use_index: bool) -> Self {
        self.use_index = use_index;
        self
    }

    pub fn max_neighbors(mut self, max_neighbors: u32) -> Self {
        self.max_neighbors = Some(max_neighbors);
        self
    }

    pub fn compress_neighbors(mut self, compression: NeighborCompression) -> Self {
        self.compress_neighbors = Some(compression);
        self
    }

    pub fn distance_metric(mut self, distance: Distance) -> Self {
        self.distance_metric = Some(distance);
        self
    }

    pub fn db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// 实际使用的距离函数
    pub fn distance(&self) -> Distance {
        self.distance_metric.unwrap_or_else(|| Distance::for_metric(&self.metric))
    }

    /// 用于结果文件命名的算法名称
    pub fn name(&self) -> String {
        if !self.use_index {
            return format!("LibSQL(bruteforce,{})", self.distance());
        }
        let mut parts = vec!["diskann".to_string()];
        if let Some(n) = self.max_neighbors {
            parts.push(format!("n{n}"));
        }
        if let Some(c) = self.compress_neighbors {
            parts.push(format!("c{c}"));
        }
        format!("LibSQL({},{})", parts.join("-"), self.distance())
    }
}

impl fmt::Display for LibSqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.use_index {
            return write!(f, "LibSQL(bruteforce,{})", self.distance());
        }
        write!(f, "LibSQL(index,{}", self.distance())?;
        if let Some(n) = self.max_neighbors {
            write!(f, ",n={n}")?;
        }
        if let Some(c) = self.compress_neighbors {
            write!(f, ",c={c}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_for_metric() {
        assert_eq!(Distance::for_metric("angular"), Distance::Cosine);
        assert_eq!(Distance::for_metric("euclidean"), Distance::L2);
        assert_eq!(Distance::for_metric("hamming"), Distance::L2);
    }

    #[test]
    fn test_distance_override() {
        let config = LibSqlConfig::new("angular");
        assert_eq!(config.distance(), Distance::Cosine);
        let config = config.distance_metric(Distance::L2);
        assert_eq!(config.distance(), Distance::L2);
    }

    #[test]
    fn test_defaults() {
        let config = LibSqlConfig::new("euclidean");
        assert!(config.use_index);
        assert_eq!(config.db_path, PathBuf::from(MEMORY_DB));
        assert_eq!(config.max_neighbors, None);
        assert_eq!(config.compress_neighbors, None);
    }

    #[test]
    fn test_names() {
        let config = LibSqlConfig::new("euclidean");
        assert_eq!(config.name(), "LibSQL(diskann,l2)");
        assert_eq!(config.to_string(), "LibSQL(index,l2)");

        let config = config.max_neighbors(32).compress_neighbors(NeighborCompression::Float8);
        assert_eq!(config.name(), "LibSQL(diskann-n32-cfloat8,l2)");
        assert_eq!(config.to_string(), "LibSQL(index,l2,n=32,c=float8)");

        let config = LibSqlConfig::new("angular").use_index(false);
        assert_eq!(config.name(), "LibSQL(bruteforce,cosine)");
        assert_eq!(config.to_string(), "LibSQL(bruteforce,cosine)");
    }

    #[test]
    fn test_adapter_options() {
        let opts = AdapterOptions::parse_from([
            "run",
            "--no-index",
            "--distance-metric",
            "cosine",
            "--compress-neighbors",
            "float1bit",
        ]);
        let config = opts.to_config("euclidean");
        assert!(!config.use_index);
        assert_eq!(config.distance(), Distance::Cosine);
        assert_eq!(config.compress_neighbors, Some(NeighborCompression::Float1bit));
        assert_eq!(config.db_path, PathBuf::from(MEMORY_DB));
    }
}
