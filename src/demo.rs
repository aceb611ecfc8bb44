//! 示例页面
//!
//! 一组开启 URL 同步的控件，演示一次完整的页面渲染流程：
//! 展开短链接 → 渲染控件 → 应用控件变更 → （可选）生成短链接。

use crate::error::{ShortenError, SyncError};
use crate::shorten::{ExpandOutcome, UrlShortener};
use crate::sync::codec;
use crate::sync::{
    HeadlessRenderer, MemoryPage, Scalar, SessionState, SyncKey, UrlSynced, WidgetKind,
    WidgetSpec, WidgetValue,
};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

/// 展开短链接后最多重新渲染的次数
const MAX_RERUNS: usize = 3;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Shorten(#[from] ShortenError),

    #[error("页面上没有使用 URL 参数 {0} 的控件")]
    UnknownParam(String),

    #[error("控件变更格式应为 NAME=VALUE: {0}")]
    InvalidChange(String),

    #[error("短链接展开后页面仍在请求重新渲染")]
    TooManyReruns,
}

/// 一次页面渲染的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub outcome: ExpandOutcome,
    /// 各控件的最终取值（按页面顺序）
    pub values: Vec<(SyncKey, WidgetValue)>,
    pub short_url: Option<String>,
}

/// 示例页面上的全部控件
pub fn example_widgets() -> Vec<WidgetSpec> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).map(Scalar::Date);
    let fruits = ["Apple", "Orange", "Banana"];

    vec![
        WidgetSpec::checkbox("This is an example checkbox"),
        WidgetSpec::checkbox("Another?"),
        WidgetSpec::radio("First radio button", ["Dogs", "Cats", "Birds"]),
        WidgetSpec::text_input("Some text"),
        WidgetSpec::text_area("MORE TEXT"),
        WidgetSpec::number_input("Number input")
            .with_range(Some(Scalar::Number(1.0)), Some(Scalar::Number(10.0))),
        WidgetSpec::number_input("Float input")
            .with_range(Some(Scalar::Number(20.0)), Some(Scalar::Number(30.0))),
        WidgetSpec::slider("Test slider")
            .with_range(Some(Scalar::Number(20.0)), Some(Scalar::Number(30.0))),
        WidgetSpec::slider("Datetime slider").with_range(start, None),
        WidgetSpec::date_input("Pick a date").with_range(start, None),
        WidgetSpec::selectbox("Pick a fruit!", fruits),
        WidgetSpec::multiselect("Pick some fruit!", fruits),
        WidgetSpec::slider("Test multislider").with_value(WidgetValue::Pair(
            Scalar::Number(2.0),
            Scalar::Number(6.0),
        )),
    ]
}

fn find_widget<'w>(widgets: &'w [WidgetSpec], name: &str) -> Result<&'w WidgetSpec, DemoError> {
    widgets
        .iter()
        .find(|spec| spec.sync_key().param_name() == name)
        .ok_or_else(|| DemoError::UnknownParam(name.to_string()))
}

/// 解析 `URL参数名=取值` 形式的控件变更
///
/// 只有多选控件按逗号拆成多个选项，其余控件整体作为一个 URL 取值，
/// 因此 `(2, 6)` 这样的区间和带逗号的文本都能原样传给解码。
pub fn parse_change(change: &str) -> Result<(String, Vec<String>), DemoError> {
    let (name, value) = change
        .split_once('=')
        .ok_or_else(|| DemoError::InvalidChange(change.to_string()))?;
    let widgets = example_widgets();
    let spec = find_widget(&widgets, name)?;

    let values = match spec.kind {
        WidgetKind::Multiselect if value.is_empty() => Vec::new(),
        WidgetKind::Multiselect => value.split(',').map(|v| v.trim().to_string()).collect(),
        _ => vec![value.to_string()],
    };
    Ok((name.to_string(), values))
}

/// 渲染示例页面
///
/// `changes` 为 `(URL 参数名, URL 形式的取值)`，按顺序作为控件变更应用。
pub async fn run_example_page(
    shortener: &UrlShortener,
    session: &mut SessionState,
    page: &mut MemoryPage,
    changes: &[(String, Vec<String>)],
    shorten: bool,
) -> Result<PageReport, DemoError> {
    let mut outcome = ExpandOutcome::NotShortLink;
    let mut reruns = 0;
    loop {
        let current = shortener.expand_short_url(page).await?;
        if current != ExpandOutcome::NotShortLink {
            outcome = current;
        }
        if !page.take_rerun() {
            break;
        }
        reruns += 1;
        if reruns > MAX_RERUNS {
            return Err(DemoError::TooManyReruns);
        }
        session.reset_query_params();
        info!("[Demo] 重新渲染页面（第 {} 次）", reruns);
    }

    let widgets = example_widgets();
    let values = {
        let mut synced = UrlSynced::new(&mut *session, &mut *page, HeadlessRenderer);
        for spec in &widgets {
            synced.render(spec.clone(), true)?;
        }

        for (name, raw) in changes {
            let spec = find_widget(&widgets, name)?;
            let value = codec::decode(spec, raw).map_err(|source| SyncError::Decode {
                key: name.clone(),
                source,
            })?;
            synced.change(spec.kind, &spec.label, value)?;
        }

        widgets
            .iter()
            .filter_map(|spec| {
                synced
                    .value(spec.kind, &spec.label)
                    .map(|value| (spec.sync_key(), value.clone()))
            })
            .collect::<Vec<_>>()
    };

    let short_url = if shorten {
        Some(shortener.get_short_url(page).await?)
    } else {
        None
    };

    Ok(PageReport {
        outcome,
        values,
        short_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shorten::{FixedBranch, ShortenerConfig};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_example_param_names_are_unique() {
        let names: HashSet<String> = example_widgets()
            .iter()
            .map(|spec| spec.sync_key().param_name())
            .collect();
        assert_eq!(names.len(), example_widgets().len());
    }

    #[tokio::test]
    async fn test_change_then_shorten_then_restore() {
        let config = ShortenerConfig::new().with_db_url("sqlite::memory:");
        let shortener =
            UrlShortener::with_deployment(config, Arc::new(FixedBranch("main".into())))
                .await
                .unwrap();

        let mut session = SessionState::new();
        let mut page = MemoryPage::new();
        let changes = vec![
            ("checkbox_another?".to_string(), vec!["true".to_string()]),
            ("selectbox_pick_a_fruit!".to_string(), vec!["2".to_string()]),
        ];
        let report = run_example_page(&shortener, &mut session, &mut page, &changes, true)
            .await
            .unwrap();
        let short_url = report.short_url.unwrap();

        // 新会话只带短哈希打开
        let hash = short_url.rsplit("q=").next().unwrap();
        let mut restored_page = MemoryPage::from_query_string(&format!("q={}", hash)).unwrap();
        let mut restored_session = SessionState::new();
        let restored = run_example_page(
            &shortener,
            &mut restored_session,
            &mut restored_page,
            &[],
            false,
        )
        .await
        .unwrap();

        assert!(matches!(restored.outcome, ExpandOutcome::Expanded(_)));
        assert_eq!(
            restored_page.query_string().unwrap(),
            page.query_string().unwrap()
        );
        let lookup = |label: &str| {
            restored
                .values
                .iter()
                .find(|(key, _)| key.label == label)
                .map(|(_, value)| value.clone())
        };
        assert_eq!(lookup("Another?"), Some(WidgetValue::Bool(true)));
        assert_eq!(lookup("Pick a fruit!"), Some(WidgetValue::Choice("Banana".into())));
        assert_eq!(lookup("Number input"), Some(WidgetValue::Number(1.0)));
    }

    #[tokio::test]
    async fn test_unknown_param_is_rejected() {
        let config = ShortenerConfig::new().with_db_url("sqlite::memory:");
        let shortener =
            UrlShortener::with_deployment(config, Arc::new(FixedBranch("main".into())))
                .await
                .unwrap();
        let mut session = SessionState::new();
        let mut page = MemoryPage::new();

        let err = run_example_page(
            &shortener,
            &mut session,
            &mut page,
            &[("nope".to_string(), vec!["1".to_string()])],
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DemoError::UnknownParam(name) if name == "nope"));
    }

    #[test]
    fn test_parse_change_splits_only_multiselect() {
        assert_eq!(
            parse_change("slider_test_multislider=(2, 6)").unwrap(),
            ("slider_test_multislider".to_string(), vec!["(2, 6)".to_string()])
        );
        assert_eq!(
            parse_change("text_input_some_text=hello, world").unwrap(),
            ("text_input_some_text".to_string(), vec!["hello, world".to_string()])
        );
        assert_eq!(
            parse_change("multiselect_pick_some_fruit!=Apple,Banana").unwrap(),
            (
                "multiselect_pick_some_fruit!".to_string(),
                vec!["Apple".to_string(), "Banana".to_string()]
            )
        );
        assert_eq!(
            parse_change("multiselect_pick_some_fruit!=").unwrap().1,
            Vec::<String>::new()
        );
        assert!(matches!(
            parse_change("checkbox_another?"),
            Err(DemoError::InvalidChange(_))
        ));
        assert!(matches!(
            parse_change("nope=1"),
            Err(DemoError::UnknownParam(name)) if name == "nope"
        ));
    }

    #[tokio::test]
    async fn test_comma_values_apply_to_page() {
        let config = ShortenerConfig::new().with_db_url("sqlite::memory:");
        let shortener =
            UrlShortener::with_deployment(config, Arc::new(FixedBranch("main".into())))
                .await
                .unwrap();
        let mut session = SessionState::new();
        let mut page = MemoryPage::new();

        let changes = [
            "slider_test_multislider=(2, 6)",
            "text_input_some_text=hello, world",
            "multiselect_pick_some_fruit!=Apple,Banana",
        ]
        .iter()
        .map(|change| parse_change(change))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
        let report = run_example_page(&shortener, &mut session, &mut page, &changes, false)
            .await
            .unwrap();

        let lookup = |label: &str| {
            report
                .values
                .iter()
                .find(|(key, _)| key.label == label)
                .map(|(_, value)| value.clone())
        };
        assert_eq!(
            lookup("Test multislider"),
            Some(WidgetValue::Pair(Scalar::Number(2.0), Scalar::Number(6.0)))
        );
        assert_eq!(lookup("Some text"), Some(WidgetValue::Text("hello, world".into())));
        assert_eq!(
            lookup("Pick some fruit!"),
            Some(WidgetValue::Choices(vec!["Apple".into(), "Banana".into()]))
        );
    }
}
