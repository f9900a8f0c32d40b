use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};

pub mod crud;
pub mod sql;

use crate::config::MEMORY_DB;

pub type Database = SqliteConnection;

/// 打开数据库连接，`:memory:` 表示内存数据库，其余路径不存在时自动创建
pub async fn connect(db_path: impl AsRef<Path>) -> Result<Database, sqlx::Error> {
    let db_path = db_path.as_ref();
    info!("初始化数据库连接: {}", db_path.display());

    let options = if db_path == Path::new(MEMORY_DB) {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else {
        SqliteConnectOptions::new().filename(db_path).create_if_missing(true)
    };

    options.connect().await
}

/// 在一个新的内存数据库上执行探测语句，确认 libSQL 向量函数可用
pub async fn probe_vector_support() -> Result<()> {
    let mut conn = connect(MEMORY_DB).await.context("无法打开内存数据库")?;
    let result = sqlx::query(sql::PROBE_SQL).execute(&mut conn).await;
    conn.close().await?;

    match result {
        Ok(_) => {
            debug!("libSQL 向量函数可用");
            Ok(())
        }
        Err(e) => Err(anyhow!(
            "libSQL vector support not available ({e}). Build libsql-sqlite3, compile with \
             `--no-default-features --features system-sqlite` and point LD_LIBRARY_PATH at its \
             .libs directory"
        )),
    }
}

/// 返回 SQLite 版本号
pub async fn sqlite_version(conn: &mut Database) -> Result<String, sqlx::Error> {
    sqlx::query_scalar("SELECT sqlite_version()").fetch_one(conn).await
}
