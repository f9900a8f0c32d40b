use sqlx::{Executor, Result, Sqlite};

use super::sql;
use crate::config::Distance;

/// 删除旧的向量表
pub async fn drop_table<'c, E>(executor: E) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(&sql::drop_table_sql()).execute(executor).await?;
    Ok(())
}

/// 创建维度为 `dimension` 的向量表
pub async fn create_table<'c, E>(executor: E, dimension: usize) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(&sql::create_table_sql(dimension)).execute(executor).await?;
    Ok(())
}

/// 插入一个向量
pub async fn add_vector<'c, E>(executor: E, id: i64, literal: &str) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(&sql::insert_sql()).bind(id).bind(literal).execute(executor).await?;
    Ok(())
}

/// 创建 DiskANN 索引
pub async fn create_index<'c, E>(executor: E, params: &[String]) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(&sql::create_index_sql(params)).execute(executor).await?;
    Ok(())
}

/// 统计向量表的行数
pub async fn count_vectors<'c, E>(executor: E) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(&sql::count_sql()).fetch_one(executor).await
}

/// 通过索引查询最近的 k 个向量 ID
pub async fn search_index<'c, E>(executor: E, literal: &str, k: usize) -> Result<Vec<i64>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(&sql::top_k_sql()).bind(literal).bind(k as i64).fetch_all(executor).await
}

/// 全表扫描查询最近的 k 个向量 ID
pub async fn search_brute_force<'c, E>(
    executor: E,
    literal: &str,
    k: usize,
    distance: Distance,
) -> Result<Vec<i64>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(&sql::brute_force_sql(distance))
        .bind(literal)
        .bind(k as i64)
        .fetch_all(executor)
        .await
}
