//! 错误类型

use thiserror::Error;

/// URL 参数解码失败（按控件类型的解析规则全部失败）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("无法解析数值: {0:?}")]
    InvalidNumber(String),

    #[error("无法解析日期: {0:?}")]
    InvalidDate(String),

    #[error("无法解析区间字面量: {0:?}")]
    InvalidPair(String),

    #[error("无效的选项序号 {raw:?}（共 {len} 个选项）")]
    InvalidOptionIndex { raw: String, len: usize },
}

/// 参数同步层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("参数 {key} 解码失败: {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("控件未在本轮渲染中注册: {0}")]
    UnknownWidget(String),

    #[error("选项 {value:?} 不在控件 {key} 的选项列表中")]
    ChoiceNotInOptions { key: String, value: String },

    #[error("控件 {key} 不接受该类型的值: {value}")]
    ValueKindMismatch { key: String, value: String },
}

/// 短链接层错误
#[derive(Error, Debug)]
pub enum ShortenError {
    #[error("短链接不存在或已失效: {0}")]
    NotFound(String),

    #[error("参数序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("查询串编码失败: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),

    #[error("获取部署分支失败: {0}")]
    Deployment(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ShortenError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShortenError::NotFound(_))
    }
}
