//! 查询参数模型
//!
//! 页面 URL 的查询参数在边界上全部是字符串：
//! - `RawQueryParams`：页面直接给出的形式，每个键对应一个字符串列表
//! - `ParamMap`：折叠后的形式，单值键为字符串，多值键为字符串数组

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 页面原始查询参数（重复的键按出现顺序收集）
pub type RawQueryParams = BTreeMap<String, Vec<String>>;

/// 参数映射（键有序，序列化结果与插入顺序无关）
pub type ParamMap = BTreeMap<String, ParamValue>;

/// 单个参数值：单个字符串或字符串序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// 转为原始值列表
    pub fn to_values(&self) -> Vec<String> {
        match self {
            ParamValue::Single(v) => vec![v.clone()],
            ParamValue::Multi(vs) => vs.clone(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

/// 原始参数折叠为参数映射：只有一个值的键取该值，其余保留为列表
pub fn collapse(raw: &RawQueryParams) -> ParamMap {
    raw.iter()
        .map(|(key, values)| {
            let value = match values.as_slice() {
                [single] => ParamValue::Single(single.clone()),
                _ => ParamValue::Multi(values.clone()),
            };
            (key.clone(), value)
        })
        .collect()
}

/// 参数映射展开为原始参数
pub fn expand(params: &ParamMap) -> RawQueryParams {
    params
        .iter()
        .map(|(key, value)| (key.clone(), value.to_values()))
        .collect()
}

/// 解析 `a=1&b=2&b=3` 形式的查询串（可带前导 `?`）
pub fn parse_query_string(query: &str) -> Result<RawQueryParams, serde_urlencoded::de::Error> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;

    let mut raw = RawQueryParams::new();
    for (key, value) in pairs {
        raw.entry(key).or_default().push(value);
    }
    Ok(raw)
}

/// 生成查询串，多值键重复输出
pub fn to_query_string(raw: &RawQueryParams) -> Result<String, serde_urlencoded::ser::Error> {
    let pairs: Vec<(&str, &str)> = raw
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
        .collect();
    serde_urlencoded::to_string(pairs)
}
