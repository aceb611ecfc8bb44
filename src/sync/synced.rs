//! URL 同步控件包装
//!
//! `UrlSynced` 包装一个控件构造函数（`WidgetRenderer`），签名不变，只多一个
//! `url_sync` 开关。开启后，控件取值、会话状态和 URL 参数三者保持一致：
//! - 首次渲染：URL 中有对应参数则解码后写入会话，否则使用控件初始值
//! - 值变化：编码后同时写入会话和 URL，再调用调用方的回调
//!
//! 每轮渲染创建一个新的 `UrlSynced`，会话状态由调用方跨轮保存。

use crate::error::SyncError;
use crate::sync::codec;
use crate::sync::page::{Page, WidgetRenderer};
use crate::sync::params::RawQueryParams;
use crate::sync::session::SessionState;
use crate::sync::widget::{SyncKey, WidgetKind, WidgetSpec, WidgetValue};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 值变化回调
pub type OnChange<'a> = Box<dyn FnMut(&SyncKey, &WidgetValue) + 'a>;

struct Registration<'a> {
    spec: WidgetSpec,
    on_change: Option<OnChange<'a>>,
}

pub struct UrlSynced<'a, P: Page, R: WidgetRenderer> {
    session: &'a mut SessionState,
    page: &'a mut P,
    renderer: R,
    /// 本轮渲染中开启同步的控件
    registered: HashMap<SyncKey, Registration<'a>>,
    /// URL 参数名 -> 本轮首个使用该参数名的控件
    param_owners: HashMap<String, SyncKey>,
}

impl<'a, P: Page, R: WidgetRenderer> UrlSynced<'a, P, R> {
    pub fn new(session: &'a mut SessionState, page: &'a mut P, renderer: R) -> Self {
        Self {
            session,
            page,
            renderer,
            registered: HashMap::new(),
            param_owners: HashMap::new(),
        }
    }

    /// 渲染控件；`url_sync` 为 false 时等同于直接调用被包装的控件
    pub fn render(&mut self, spec: WidgetSpec, url_sync: bool) -> Result<WidgetValue, SyncError> {
        self.render_inner(spec, url_sync, None)
    }

    /// 渲染控件并注册值变化回调
    pub fn render_with<F>(
        &mut self,
        spec: WidgetSpec,
        url_sync: bool,
        on_change: F,
    ) -> Result<WidgetValue, SyncError>
    where
        F: FnMut(&SyncKey, &WidgetValue) + 'a,
    {
        self.render_inner(spec, url_sync, Some(Box::new(on_change)))
    }

    fn render_inner(
        &mut self,
        spec: WidgetSpec,
        url_sync: bool,
        on_change: Option<OnChange<'a>>,
    ) -> Result<WidgetValue, SyncError> {
        if !url_sync {
            return Ok(self.renderer.render(&spec, None));
        }

        let key = spec.sync_key();
        let name = key.param_name();

        match self.param_owners.get(&name) {
            Some(owner) if owner != &key => {
                warn!(
                    "[UrlSync] 控件 {} 与 {} 使用同一个 URL 参数 {}，状态将互相覆盖",
                    key, owner, name
                );
            }
            Some(_) => {}
            None => {
                self.param_owners.insert(name.clone(), key.clone());
            }
        }

        if !self.session.contains(&key) {
            let raw = self.session.query_params(&*self.page).get(&name).cloned();
            let value = match raw {
                Some(values) => {
                    let value = codec::decode(&spec, &values).map_err(|source| {
                        SyncError::Decode {
                            key: name.clone(),
                            source,
                        }
                    })?;
                    debug!("[UrlSync] {} 从 URL 恢复: {}", name, value);
                    value
                }
                None => {
                    let value = spec.initial_value();
                    debug!("[UrlSync] {} 使用初始值: {}", name, value);
                    value
                }
            };
            self.session.insert(key.clone(), value);
        }

        let value = self.renderer.render(&spec, self.session.get(&key));
        self.registered.insert(key, Registration { spec, on_change });
        Ok(value)
    }

    /// 控件值变化：写入会话与 URL，然后调用回调
    pub fn change(
        &mut self,
        kind: WidgetKind,
        label: &str,
        value: WidgetValue,
    ) -> Result<(), SyncError> {
        let key = SyncKey::new(kind, label);
        let registration = self
            .registered
            .get_mut(&key)
            .ok_or_else(|| SyncError::UnknownWidget(key.to_string()))?;

        let encoded = codec::encode(&registration.spec, &value)?;
        let name = key.param_name();
        info!("[UrlSync] {} 变更为 {}，URL 值: {:?}", name, value, encoded);

        self.session.insert(key.clone(), value.clone());
        let mut updates = RawQueryParams::new();
        updates.insert(name, encoded);
        self.session.set_query_params(&mut *self.page, updates);

        if let Some(on_change) = registration.on_change.as_mut() {
            on_change(&key, &value);
        }
        Ok(())
    }

    /// 会话中的当前值
    pub fn value(&self, kind: WidgetKind, label: &str) -> Option<&WidgetValue> {
        self.session.get(&SyncKey::new(kind, label))
    }

    pub fn page(&self) -> &P {
        &*self.page
    }
}
