use std::path::Path;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use assert_fs::TempDir;
use hdf5::types::VarLenUnicode;
use libsql_bench::db::probe_vector_support;
use ndarray::{Array2, s};
use predicates::prelude::*;
use rand::prelude::*;
use rstest::*;

/// 生成一个查询集即训练集前几行的小数据集，真实近邻就是查询自身
fn write_dataset(path: &Path, distance: &str) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let train = Array2::<f32>::from_shape_fn((300, 8), |_| rng.random_range(-1.0..1.0));
    let test = train.slice(s![..20, ..]).to_owned();
    let neighbors = Array2::from_shape_fn((20, 1), |(i, _)| i as i32);

    let f = hdf5::File::create(path)?;
    f.new_dataset_builder().with_data(&train).create("train")?;
    f.new_dataset_builder().with_data(&test).create("test")?;
    f.new_dataset_builder().with_data(&neighbors).create("neighbors")?;
    let distance = distance.parse::<VarLenUnicode>().map_err(|e| anyhow::anyhow!("{e}"))?;
    f.new_attr::<VarLenUnicode>().shape(()).create("distance")?.write_scalar(&distance)?;
    Ok(())
}

/// 只有启用 system-sqlite 特性并链接 libSQL 时才会运行需要向量扩展的测试
async fn require_vector_support() -> Result<()> {
    probe_vector_support().await
}

#[tokio::test]
async fn probe_matches_support() -> Result<()> {
    let supported = probe_vector_support().await.is_ok();
    let assert = Command::cargo_bin("libsql-bench")?.arg("probe").assert();
    if supported {
        assert.success().stdout(predicate::str::contains("vector support available"));
    } else {
        assert.code(1);
    }
    Ok(())
}

#[tokio::test]
#[cfg_attr(feature = "system-sqlite", ignore = "内置 SQLite 不带向量扩展")]
async fn run_without_vector_support_fails() -> Result<()> {
    assert!(probe_vector_support().await.is_err());
    let dir = TempDir::new()?;
    let dataset = dir.path().join("tiny-8-euclidean.hdf5");
    write_dataset(&dataset, "euclidean")?;

    Command::cargo_bin("libsql-bench")?
        .arg("run")
        .arg(&dataset)
        .arg("-o")
        .arg(dir.path().join("results"))
        .assert()
        .code(1);
    assert!(!dir.path().join("results").exists());
    Ok(())
}

#[rstest]
#[case::euclidean("euclidean", "LibSQL_bruteforce_l2_.hdf5")]
#[case::angular("angular", "LibSQL_bruteforce_cosine_.hdf5")]
#[tokio::test]
#[cfg_attr(not(feature = "system-sqlite"), ignore = "需要 libSQL 向量扩展")]
async fn run_then_analyze(#[case] distance: &str, #[case] file_name: &str) -> Result<()> {
    require_vector_support().await?;
    let dir = TempDir::new()?;
    let dataset = dir.path().join(format!("tiny-8-{distance}.hdf5"));
    write_dataset(&dataset, distance)?;
    let output = dir.path().join("results");

    Command::cargo_bin("libsql-bench")?
        .arg("run")
        .arg(&dataset)
        .args(["--no-index", "-k", "1", "--runs", "2", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("QUERY PERFORMANCE SUMMARY"));

    let result = output.join(format!("tiny-8-{distance}/1/libsql")).join(file_name);
    assert!(result.exists(), "{} not found", result.display());

    Command::cargo_bin("analyzer")?
        .arg(&result)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total queries:      20"))
        .stdout(predicate::str::contains("Mean recall:        1.000000"))
        .stdout(predicate::str::contains("run_count: 2"));
    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "system-sqlite"), ignore = "需要 libSQL 向量扩展")]
async fn run_with_index() -> Result<()> {
    require_vector_support().await?;
    let dir = TempDir::new()?;
    let dataset = dir.path().join("tiny-8-euclidean.hdf5");
    write_dataset(&dataset, "euclidean")?;
    let output = dir.path().join("results");

    Command::cargo_bin("libsql-bench")?
        .arg("run")
        .arg(&dataset)
        .args(["--max-neighbors", "16", "--compress-neighbors", "float8", "-o"])
        .arg(&output)
        .assert()
        .success();

    let result = output.join("tiny-8-euclidean/10/libsql/LibSQL_diskann-n16-cfloat8_l2_.hdf5");
    assert!(result.exists());
    Ok(())
}
