//! 页面与控件渲染的外部协作接口
//!
//! UI 框架本身不在本 crate 范围内，这里只约定同步层需要的能力，
//! 并提供一个无界面的内存实现，供测试和命令行演示使用。

use crate::sync::params::{self, RawQueryParams};
use crate::sync::widget::{WidgetSpec, WidgetValue};
use tracing::debug;

/// 当前页面：读取 / 替换查询参数，触发重新渲染，展示消息
pub trait Page {
    /// 当前 URL 的查询参数
    fn query_params(&self) -> RawQueryParams;

    /// 替换当前 URL 的全部查询参数
    fn set_query_params(&mut self, params: RawQueryParams);

    /// 请求重新执行一轮渲染
    fn rerun(&mut self);

    /// 展示错误提示
    fn error(&mut self, message: &str);

    /// 展示普通文本
    fn write(&mut self, text: &str);
}

/// 控件构造函数：根据控件描述和会话中的当前值返回控件当前值
pub trait WidgetRenderer {
    fn render(&mut self, spec: &WidgetSpec, state: Option<&WidgetValue>) -> WidgetValue;
}

/// 内存页面
#[derive(Debug, Default, Clone)]
pub struct MemoryPage {
    params: RawQueryParams,
    rerun_requested: bool,
    errors: Vec<String>,
    output: Vec<String>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以查询串打开页面，例如 `?q=abc`
    pub fn from_query_string(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        Ok(Self {
            params: params::parse_query_string(query)?,
            ..Self::default()
        })
    }

    /// 当前地址栏中的查询串
    pub fn query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        params::to_query_string(&self.params)
    }

    /// 取走重新渲染请求
    pub fn take_rerun(&mut self) -> bool {
        std::mem::take(&mut self.rerun_requested)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }
}

impl Page for MemoryPage {
    fn query_params(&self) -> RawQueryParams {
        self.params.clone()
    }

    fn set_query_params(&mut self, params: RawQueryParams) {
        debug!("[MemoryPage] 更新查询参数: {:?}", params);
        self.params = params;
    }

    fn rerun(&mut self) {
        self.rerun_requested = true;
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn write(&mut self, text: &str) {
        self.output.push(text.to_string());
    }
}

/// 无界面渲染：控件值即会话中的值，没有会话值时使用控件初始值
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessRenderer;

impl WidgetRenderer for HeadlessRenderer {
    fn render(&mut self, spec: &WidgetSpec, state: Option<&WidgetValue>) -> WidgetValue {
        state.cloned().unwrap_or_else(|| spec.initial_value())
    }
}
