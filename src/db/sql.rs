//! libSQL 向量扩展相关的 SQL 语句

use std::fmt::Write;

use crate::config::{Distance, NeighborCompression};

/// 存放向量的表名
pub const TABLE: &str = "vectors";
/// DiskANN 索引名
pub const INDEX: &str = "vectors_idx";

/// 检查向量扩展是否可用的探测语句
pub const PROBE_SQL: &str = "SELECT vector('[1,2,3]')";

/// 将向量序列化为 libSQL 的向量字面量，如 `[0.100000,2.000000]`
pub fn vector_literal(v: &[f32]) -> String {
    let mut s = String::with_capacity(v.len() * 10 + 2);
    s.push('[');
    for (i, x) in v.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        let _ = write!(s, "{x:.6}");
    }
    s.push(']');
    s
}

pub fn drop_table_sql() -> String {
    format!("DROP TABLE IF EXISTS {TABLE}")
}

pub fn create_table_sql(dimension: usize) -> String {
    format!("CREATE TABLE {TABLE} (id INTEGER PRIMARY KEY, embedding F32_BLOB({dimension}))")
}

pub fn insert_sql() -> String {
    format!("INSERT INTO {TABLE} (id, embedding) VALUES (?, vector(?))")
}

pub fn count_sql() -> String {
    format!("SELECT COUNT(*) FROM {TABLE}")
}

/// 索引参数，未指定的参数不会出现在语句中，由 libSQL 使用默认值
///
/// 余弦距离是 libSQL 的默认度量，因此只有 L2 需要显式指定
pub fn index_params(
    distance: Distance,
    max_neighbors: Option<u32>,
    compression: Option<NeighborCompression>,
) -> Vec<String> {
    let mut params = vec![];
    if distance == Distance::L2 {
        params.push("'metric=l2'".to_string());
    }
    if let Some(n) = max_neighbors {
        params.push(format!("'max_neighbors={n}'"));
    }
    if let Some(c) = compression {
        params.push(format!("'compress_neighbors={c}'"));
    }
    params
}

pub fn create_index_sql(params: &[String]) -> String {
    let mut args = String::from("embedding");
    for param in params {
        args.push_str(", ");
        args.push_str(param);
    }
    format!("CREATE INDEX {INDEX} ON {TABLE} (libsql_vector_idx({args}))")
}

/// 通过 DiskANN 索引查询 top-k，参数依次为向量字面量和 k
pub fn top_k_sql() -> String {
    format!(
        "SELECT v.id FROM vector_top_k('{INDEX}', vector(?), ?) AS vt \
         JOIN {TABLE} AS v ON v.rowid = vt.rowid"
    )
}

/// 全表扫描的精确查询，参数依次为向量字面量和 k
pub fn brute_force_sql(distance: Distance) -> String {
    format!(
        "SELECT id FROM {TABLE} ORDER BY {}(embedding, vector(?)) LIMIT ?",
        distance.sql_function()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[]), "[]");
        assert_eq!(vector_literal(&[1.]), "[1.000000]");
        assert_eq!(vector_literal(&[0.5, -2., 0.1234567]), "[0.500000,-2.000000,0.123457]");
    }

    #[test]
    fn test_create_table() {
        assert_eq!(
            create_table_sql(784),
            "CREATE TABLE vectors (id INTEGER PRIMARY KEY, embedding F32_BLOB(784))"
        );
    }

    #[test]
    fn test_index_default_params() {
        let params = index_params(Distance::Cosine, None, None);
        assert!(params.is_empty());
        assert_eq!(
            create_index_sql(&params),
            "CREATE INDEX vectors_idx ON vectors (libsql_vector_idx(embedding))"
        );
    }

    #[test]
    fn test_index_all_params() {
        let params = index_params(Distance::L2, Some(32), Some(NeighborCompression::Float8));
        assert_eq!(
            create_index_sql(&params),
            "CREATE INDEX vectors_idx ON vectors (libsql_vector_idx(embedding, 'metric=l2', \
             'max_neighbors=32', 'compress_neighbors=float8'))"
        );
    }

    #[test]
    fn test_query_sql() {
        assert!(top_k_sql().contains("vector_top_k('vectors_idx', vector(?), ?)"));
        assert_eq!(
            brute_force_sql(Distance::Cosine),
            "SELECT id FROM vectors ORDER BY vector_distance_cos(embedding, vector(?)) LIMIT ?"
        );
        assert!(brute_force_sql(Distance::L2).contains("vector_distance_l2"));
    }
}
