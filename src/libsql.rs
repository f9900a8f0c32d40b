use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use log::{info, warn};
use ndarray::{ArrayView1, ArrayView2, s};
use sqlx::Connection;

use crate::algorithm::{AnnAlgorithm, BatchResult};
use crate::config::{Distance, LibSqlConfig};
use crate::db::{self, Database, crud, sql};
use crate::utils::{pb_style, pb_style_speed};

/// 每个插入事务包含的向量数量
pub const INSERT_BATCH_SIZE: usize = 1000;

/// 基于 libSQL 原生向量扩展的近似最近邻算法
pub struct LibSql {
    config: LibSqlConfig,
    distance: Distance,
    conn: Database,
    /// 最近一次 fit 的向量维度，未 fit 时为 `None`
    dimension: Option<usize>,
    build_time: Duration,
}

impl LibSql {
    /// 检查向量扩展并打开数据库
    ///
    /// 向量扩展不可用时直接返回错误，不会打开 `config.db_path`
    pub async fn new(config: LibSqlConfig) -> Result<Self> {
        db::probe_vector_support().await?;

        let mut conn = db::connect(&config.db_path)
            .await
            .with_context(|| format!("无法打开数据库 {}", config.db_path.display()))?;
        let version = db::sqlite_version(&mut conn).await?;
        info!("已连接到 libSQL (SQLite {version})，数据库: {}", config.db_path.display());

        Ok(Self {
            distance: config.distance(),
            config,
            conn,
            dimension: None,
            build_time: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &LibSqlConfig {
        &self.config
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// 最近一次 fit 中插入和建立索引的总耗时
    pub fn build_time(&self) -> Duration {
        self.build_time
    }

    /// 向量表中的行数
    pub async fn row_count(&mut self) -> Result<i64> {
        Ok(crud::count_vectors(&mut self.conn).await?)
    }

    /// 关闭数据库连接
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    /// 在一个事务中插入一批向量，任意一条失败则回滚整批
    async fn insert_batch(&mut self, first_id: usize, batch: ArrayView2<'_, f32>) -> Result<()> {
        let mut tx = self.conn.begin().await?;

        let mut result = Ok(());
        for offset in 0..batch.nrows() {
            let literal = sql::vector_literal(&batch.row(offset).to_vec());
            result = crud::add_vector(&mut *tx, (first_id + offset) as i64, &literal).await;
            if result.is_err() {
                break;
            }
        }

        let Err(e) = result else {
            tx.commit().await?;
            return Ok(());
        };
        let err = anyhow::Error::from(e).context(format!("插入第 {first_id} 个向量开始的批次失败"));
        match tx.rollback().await {
            Ok(()) => Err(err),
            Err(rollback) => Err(err.context(format!("回滚失败: {rollback}"))),
        }
    }

    async fn build_index(&mut self) -> Result<()> {
        let params = sql::index_params(
            self.distance,
            self.config.max_neighbors,
            self.config.compress_neighbors,
        );
        if params.is_empty() {
            info!("创建 DiskANN 索引，参数: default");
        } else {
            info!("创建 DiskANN 索引，参数: {}", params.join(", "));
        }

        let start = Instant::now();
        crud::create_index(&mut self.conn, &params).await.context("创建索引失败")?;
        info!("索引创建完成，耗时 {:.2}s", start.elapsed().as_secs_f32());
        Ok(())
    }

    async fn query_literal(&mut self, literal: &str, k: usize) -> Result<Vec<i64>> {
        if self.config.use_index {
            match crud::search_index(&mut self.conn, literal, k).await {
                Ok(ids) => return Ok(ids),
                Err(e) => warn!("索引查询失败: {e}，改用暴力搜索"),
            }
        }
        Ok(crud::search_brute_force(&mut self.conn, literal, k, self.distance).await?)
    }
}

impl AnnAlgorithm for LibSql {
    async fn fit(&mut self, x: ArrayView2<'_, f32>) -> Result<()> {
        let (count, dimension) = x.dim();
        if dimension == 0 {
            bail!("向量维度不能为 0");
        }

        info!("开始构建 {count} 个 {dimension} 维向量");
        info!("使用索引: {}，距离: {}", self.config.use_index, self.distance);
        let start = Instant::now();

        if let Err(e) = crud::drop_table(&mut self.conn).await {
            warn!("删除旧表失败: {e}");
        }
        crud::create_table(&mut self.conn, dimension).await.context("创建向量表失败")?;
        self.dimension = Some(dimension);

        let pb = ProgressBar::new(count as u64).with_style(pb_style_speed());
        pb.set_message("插入向量");
        for first_id in (0..count).step_by(INSERT_BATCH_SIZE) {
            let batch = x.slice(s![first_id..(first_id + INSERT_BATCH_SIZE).min(count), ..]);
            if let Err(e) = self.insert_batch(first_id, batch).await {
                pb.abandon_with_message("插入失败");
                return Err(e);
            }
            pb.inc(batch.nrows() as u64);
        }
        pb.finish_with_message("插入完成");

        let elapsed = start.elapsed().as_secs_f64();
        info!("插入完成，耗时 {elapsed:.2}s，{:.0} vec/s", count as f64 / elapsed);

        if self.config.use_index {
            self.build_index().await?;
        } else {
            info!("跳过索引构建（暴力搜索模式）");
        }

        self.build_time = start.elapsed();
        Ok(())
    }

    async fn query(&mut self, v: ArrayView1<'_, f32>, k: usize) -> Result<Vec<i64>> {
        match self.dimension {
            None => bail!("query 必须在 fit 之后调用"),
            Some(d) if d != v.len() => bail!("查询向量维度 {} 与数据维度 {d} 不一致", v.len()),
            _ => {}
        }
        let literal = sql::vector_literal(&v.to_vec());
        self.query_literal(&literal, k).await
    }

    async fn batch_query(&mut self, x: ArrayView2<'_, f32>, k: usize) -> Result<BatchResult> {
        let pb = ProgressBar::new(x.nrows() as u64).with_style(pb_style());
        pb.set_message("查询中");

        let start = Instant::now();
        let mut result = BatchResult::default();
        for i in 0..x.nrows() {
            let query_start = Instant::now();
            let ids = self.query(x.row(i), k).await?;
            result.times.push(query_start.elapsed().as_secs_f64());
            result.neighbors.push(ids);
            pb.inc(1);
        }
        result.total = start.elapsed();
        pb.finish_with_message("查询完成");

        print_batch_summary(&result);
        Ok(result)
    }

    fn name(&self) -> String {
        self.config.name()
    }
}

fn print_batch_summary(result: &BatchResult) {
    let Some(latency) = result.latency() else {
        return;
    };
    let line = "=".repeat(60);
    println!("\n{line}");
    println!("QUERY PERFORMANCE SUMMARY");
    println!("{line}");
    println!("Total queries:        {}", result.len());
    println!("Total time:           {:.2}s", result.total.as_secs_f64());
    println!("QPS:                  {:.2} queries/sec", result.qps());
    println!("Avg query time:       {:.2}ms", latency.mean * 1000.);
    println!("Median query time:    {:.2}ms", latency.median * 1000.);
    println!("P95 query time:       {:.2}ms", latency.p95 * 1000.);
    println!("P99 query time:       {:.2}ms", latency.p99 * 1000.);
    println!("Min query time:       {:.2}ms", latency.min * 1000.);
    println!("Max query time:       {:.2}ms", latency.max * 1000.);
    println!("{line}\n");
}
