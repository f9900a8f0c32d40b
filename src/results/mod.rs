//! ann-benchmarks 结果文件的读取与分析

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Attribute, File};
use serde::Serialize;

mod report;
mod writer;

pub use report::*;
pub use writer::*;

/// 查询耗时数据集，单位为秒
pub const TIMES: &str = "times";
/// 每个查询的召回率数据集
pub const RECALLS: &str = "recalls";
/// 候选数量数据集
pub const CANDIDATES: &str = "candidates";

/// 结果文件中的一个属性值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Array(Vec<f64>),
    /// 无法解析的类型，保存类型描述
    Unsupported(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Array(v) => write!(f, "{v:?}"),
            Self::Unsupported(desc) => write!(f, "<{desc}>"),
        }
    }
}

/// 读取定长字符串属性时使用的缓冲区长度，更长的内容会被截断
const FIXED_STRING_LEN: usize = 1024;

/// 从 HDF5 文件中读出的基准测试结果
#[derive(Debug, Clone)]
pub struct ResultFile {
    pub path: PathBuf,
    pub times: Option<Vec<f64>>,
    pub recalls: Option<Vec<f64>>,
    pub candidates: Option<Vec<f64>>,
    /// 根节点上的所有属性
    pub attrs: Vec<(String, AttrValue)>,
    /// 根节点下的所有成员名称
    pub keys: Vec<String>,
}

impl ResultFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("无法打开 {}", path.display()))?;

        let mut attrs = vec![];
        for name in file.attr_names()? {
            let attr = file.attr(&name)?;
            let value = read_attr(&attr).with_context(|| format!("无法读取属性 {name}"))?;
            attrs.push((name, value));
        }

        Ok(Self {
            path: path.to_path_buf(),
            times: read_optional(&file, TIMES)?,
            recalls: read_optional(&file, RECALLS)?,
            candidates: read_optional(&file, CANDIDATES)?,
            attrs,
            keys: file.member_names()?,
        })
    }

    /// 文件名，不含目录
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }
}

/// 读取一个数值数据集，不存在时返回 `None`
fn read_optional(file: &File, name: &str) -> Result<Option<Vec<f64>>> {
    if !file.link_exists(name) {
        return Ok(None);
    }
    let values = file
        .dataset(name)
        .and_then(|ds| ds.read_raw::<f64>())
        .with_context(|| format!("无法读取数据集 {name}"))?;
    Ok(Some(values))
}

fn read_attr(attr: &Attribute) -> hdf5::Result<AttrValue> {
    let desc = attr.dtype()?.to_descriptor()?;

    if !attr.is_scalar() {
        return Ok(match desc {
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) | TypeDescriptor::Float(_) => {
                AttrValue::Array(attr.read_raw::<f64>()?)
            }
            other => AttrValue::Unsupported(format!("array of {other}")),
        });
    }

    Ok(match desc {
        TypeDescriptor::Integer(_) => AttrValue::Int(attr.read_scalar::<i64>()?),
        TypeDescriptor::Unsigned(_) => AttrValue::Int(attr.read_scalar::<u64>()? as i64),
        TypeDescriptor::Float(_) => AttrValue::Float(attr.read_scalar::<f64>()?),
        TypeDescriptor::Boolean => AttrValue::Bool(attr.read_scalar::<bool>()?),
        TypeDescriptor::VarLenUnicode => {
            AttrValue::Text(attr.read_scalar::<VarLenUnicode>()?.as_str().to_owned())
        }
        TypeDescriptor::VarLenAscii => {
            AttrValue::Text(attr.read_scalar::<VarLenAscii>()?.as_str().to_owned())
        }
        TypeDescriptor::FixedAscii(_) => AttrValue::Text(
            attr.read_scalar::<FixedAscii<FIXED_STRING_LEN>>()?.as_str().to_owned(),
        ),
        TypeDescriptor::FixedUnicode(_) => AttrValue::Text(
            attr.read_scalar::<FixedUnicode<FIXED_STRING_LEN>>()?.as_str().to_owned(),
        ),
        other => AttrValue::Unsupported(other.to_string()),
    })
}
