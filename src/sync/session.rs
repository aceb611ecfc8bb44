//! 会话状态
//!
//! 每个浏览器会话一份，跨多轮渲染保留。按 `SyncKey` 保存控件取值，
//! 并缓存一份页面查询参数的本地副本。

use crate::sync::page::Page;
use crate::sync::params::RawQueryParams;
use crate::sync::widget::{SyncKey, WidgetValue};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct SessionState {
    values: HashMap<SyncKey, WidgetValue>,
    query_params: RawQueryParams,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SyncKey) -> Option<&WidgetValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &SyncKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: SyncKey, value: WidgetValue) -> Option<WidgetValue> {
        self.values.insert(key, value)
    }

    pub fn remove(&mut self, key: &SyncKey) -> Option<WidgetValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 查询参数副本：本地副本为空时从页面读取，否则直接返回本地副本
    pub fn query_params(&mut self, page: &dyn Page) -> &RawQueryParams {
        if self.query_params.is_empty() {
            self.query_params = page.query_params();
            debug!(
                "[Session] 从页面读取查询参数，共 {} 个",
                self.query_params.len()
            );
        }
        &self.query_params
    }

    /// 更新本地副本中的若干参数，并把完整参数写回页面
    pub fn set_query_params(&mut self, page: &mut dyn Page, updates: RawQueryParams) {
        if self.query_params.is_empty() {
            self.query_params = page.query_params();
        }
        self.query_params.extend(updates);
        page.set_query_params(self.query_params.clone());
    }

    /// 丢弃本地副本，下次访问时重新读取页面
    pub fn reset_query_params(&mut self) {
        self.query_params.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::page::MemoryPage;

    #[test]
    fn test_query_params_cached_after_first_read() {
        let mut page = MemoryPage::from_query_string("a=1").unwrap();
        let mut session = SessionState::new();

        assert_eq!(session.query_params(&page).get("a"), Some(&vec!["1".into()]));

        page.set_query_params(RawQueryParams::new());
        // 页面变化后仍返回本地副本
        assert_eq!(session.query_params(&page).get("a"), Some(&vec!["1".into()]));

        session.reset_query_params();
        assert!(session.query_params(&page).is_empty());
    }

    #[test]
    fn test_set_query_params_merges_and_writes_back() {
        let mut page = MemoryPage::from_query_string("a=1&b=2").unwrap();
        let mut session = SessionState::new();

        let mut updates = RawQueryParams::new();
        updates.insert("b".into(), vec!["3".into()]);
        updates.insert("c".into(), vec!["x".into(), "y".into()]);
        session.set_query_params(&mut page, updates);

        assert_eq!(page.query_string().unwrap(), "a=1&b=3&c=x&c=y");
    }
}
