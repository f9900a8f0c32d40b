use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use hdf5::File;
use hdf5::types::VarLenUnicode;
use ndarray::Array2;

use super::AttrValue;

/// 以 ann-benchmarks 的格式写入结果文件
pub struct ResultWriter {
    file: File,
}

impl ResultWriter {
    /// 创建结果文件，父目录不存在时自动创建，已存在的文件会被覆盖
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建目录 {}", parent.display()))?;
        }
        let file = File::create(path).with_context(|| format!("无法创建 {}", path.display()))?;
        Ok(Self { file })
    }

    /// 写入一维数值数据集
    pub fn write_values(&self, name: &str, values: &[f64]) -> Result<()> {
        self.file
            .new_dataset_builder()
            .with_data(values)
            .create(name)
            .with_context(|| format!("无法写入数据集 {name}"))?;
        Ok(())
    }

    /// 写入每个查询的近邻 ID，不足 k 个的位置填充 -1
    pub fn write_neighbors(&self, neighbors: &[Vec<i64>], k: usize) -> Result<()> {
        let mut arr = Array2::<i32>::from_elem((neighbors.len(), k), -1);
        for (mut row, ids) in arr.rows_mut().into_iter().zip(neighbors) {
            for (slot, id) in row.iter_mut().zip(ids) {
                *slot = i32::try_from(*id).with_context(|| format!("近邻 ID {id} 超出 i32 范围"))?;
            }
        }
        self.file
            .new_dataset_builder()
            .with_data(&arr)
            .create("neighbors")
            .context("无法写入数据集 neighbors")?;
        Ok(())
    }

    /// 在根节点上写入一个标量或一维数组属性
    pub fn set_attr(&self, name: &str, value: &AttrValue) -> Result<()> {
        match value {
            AttrValue::Int(v) => {
                self.file.new_attr::<i64>().shape(()).create(name)?.write_scalar(v)?
            }
            AttrValue::Float(v) => {
                self.file.new_attr::<f64>().shape(()).create(name)?.write_scalar(v)?
            }
            AttrValue::Bool(v) => {
                self.file.new_attr::<bool>().shape(()).create(name)?.write_scalar(v)?
            }
            AttrValue::Text(v) => {
                let v = v.parse::<VarLenUnicode>().map_err(|e| anyhow!("无效的字符串 {v}: {e}"))?;
                self.file.new_attr::<VarLenUnicode>().shape(()).create(name)?.write_scalar(&v)?
            }
            AttrValue::Array(v) => {
                self.file.new_attr::<f64>().shape(v.len()).create(name)?.write_raw(v.as_slice())?
            }
            AttrValue::Unsupported(desc) => bail!("无法写入类型为 {desc} 的属性 {name}"),
        }
        Ok(())
    }
}
