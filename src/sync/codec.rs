//! 控件取值与 URL 字符串之间的编解码
//!
//! 解码规则按控件类型区分；区间滑块按「数值 → 日期 → 区间字面量」的顺序依次尝试，
//! 顺序不可调整。解码失败直接返回错误，不回退到默认值。

use crate::error::{DecodeError, SyncError};
use crate::sync::widget::{Scalar, WidgetKind, WidgetSpec, WidgetValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d %B %Y", "%B %d, %Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// 布尔值：忽略大小写与 "true" 比较
pub fn parse_bool(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// 浮点数
pub fn parse_number(raw: &str) -> Result<f64, DecodeError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DecodeError::InvalidNumber(raw.to_string()))
}

/// 结构化日期解析，带时间的输入只保留日期部分
pub fn parse_date(raw: &str) -> Result<NaiveDate, DecodeError> {
    let s = raw.trim();

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Ok(date);
    }
    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Ok(datetime.date());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| DecodeError::InvalidDate(raw.to_string()))
}

/// 区间字面量，例如 `(2, 6)`、`[20.5, 30]`、`('2022-01-01', '2022-02-01')`
pub fn parse_pair(raw: &str) -> Result<(Scalar, Scalar), DecodeError> {
    let err = || DecodeError::InvalidPair(raw.to_string());

    let s = raw.trim();
    let inner = s
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .or_else(|| s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')))
        .ok_or_else(err)?;

    let items = split_top_level(inner);
    match items.as_slice() {
        [a, b] => Ok((
            parse_scalar(a).ok_or_else(err)?,
            parse_scalar(b).ok_or_else(err)?,
        )),
        _ => Err(err()),
    }
}

/// 按引号外的逗号切分，引号内的逗号（如 `'January 1, 2022'`）保留在元素中
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, ',') => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(inner[start..].trim());
    items
}

fn parse_scalar(item: &str) -> Option<Scalar> {
    let unquoted = item
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| item.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(item);

    parse_number(unquoted)
        .map(Scalar::Number)
        .or_else(|_| parse_date(unquoted).map(Scalar::Date))
        .ok()
}

/// 区间滑块：数值 → 日期 → 区间字面量
pub fn parse_slider(raw: &str) -> Result<WidgetValue, DecodeError> {
    parse_number(raw)
        .map(WidgetValue::Number)
        .or_else(|_| parse_date(raw).map(WidgetValue::Date))
        .or_else(|_| parse_pair(raw).map(|(a, b)| WidgetValue::Pair(a, b)))
}

/// 按控件类型解码 URL 参数值
///
/// `raw` 为该参数在 URL 中的全部取值；除多选控件外只使用第一个值。
pub fn decode(spec: &WidgetSpec, raw: &[String]) -> Result<WidgetValue, DecodeError> {
    let first = raw.first().map(String::as_str).unwrap_or_default();
    match spec.kind {
        WidgetKind::Multiselect => Ok(WidgetValue::Choices(raw.to_vec())),
        WidgetKind::Checkbox => Ok(WidgetValue::Bool(parse_bool(first))),
        WidgetKind::Radio | WidgetKind::Selectbox => {
            let invalid = || DecodeError::InvalidOptionIndex {
                raw: first.to_string(),
                len: spec.options.len(),
            };
            // 负序号从末尾计数，-1 为最后一个选项
            let ordinal: i64 = first.trim().parse().map_err(|_| invalid())?;
            let len = spec.options.len() as i64;
            let index = if ordinal < 0 { ordinal + len } else { ordinal };
            usize::try_from(index)
                .ok()
                .and_then(|index| spec.options.get(index))
                .map(|option| WidgetValue::Choice(option.clone()))
                .ok_or_else(invalid)
        }
        WidgetKind::TextInput | WidgetKind::TextArea => Ok(WidgetValue::Text(first.to_string())),
        WidgetKind::NumberInput => parse_number(first).map(WidgetValue::Number),
        WidgetKind::DateInput => parse_date(first).map(WidgetValue::Date),
        WidgetKind::Slider => parse_slider(first),
    }
}

/// 检查取值类型是否与控件类型匹配
pub fn accepts(kind: WidgetKind, value: &WidgetValue) -> bool {
    matches!(
        (kind, value),
        (WidgetKind::Checkbox, WidgetValue::Bool(_))
            | (WidgetKind::Radio | WidgetKind::Selectbox, WidgetValue::Choice(_))
            | (WidgetKind::Multiselect, WidgetValue::Choices(_))
            | (WidgetKind::TextInput | WidgetKind::TextArea, WidgetValue::Text(_))
            | (WidgetKind::NumberInput, WidgetValue::Number(_))
            | (WidgetKind::DateInput, WidgetValue::Date(_))
            | (
                WidgetKind::Slider,
                WidgetValue::Number(_) | WidgetValue::Date(_) | WidgetValue::Pair(_, _)
            )
    )
}

/// 编码为 URL 参数值
///
/// 单选控件编码为选项序号；多选控件每个选项一个值；区间编码为 `(a, b)`。
pub fn encode(spec: &WidgetSpec, value: &WidgetValue) -> Result<Vec<String>, SyncError> {
    let key = spec.sync_key().param_name();
    if !accepts(spec.kind, value) {
        return Err(SyncError::ValueKindMismatch {
            key,
            value: value.to_string(),
        });
    }

    let encoded = match value {
        WidgetValue::Choice(choice) => {
            let index = spec
                .options
                .iter()
                .position(|option| option == choice)
                .ok_or_else(|| SyncError::ChoiceNotInOptions {
                    key,
                    value: choice.clone(),
                })?;
            vec![index.to_string()]
        }
        WidgetValue::Choices(choices) => choices.clone(),
        other => vec![other.to_string()],
    };
    Ok(encoded)
}
