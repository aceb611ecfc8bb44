//! 控件描述与控件取值

use chrono::{Local, NaiveDate};
use std::fmt;

/// 支持 URL 同步的控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WidgetKind {
    Checkbox,
    Radio,
    Selectbox,
    Multiselect,
    TextInput,
    TextArea,
    NumberInput,
    Slider,
    DateInput,
}

impl WidgetKind {
    /// 控件类型名（参与 URL 参数名的生成）
    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Radio => "radio",
            WidgetKind::Selectbox => "selectbox",
            WidgetKind::Multiselect => "multiselect",
            WidgetKind::TextInput => "text_input",
            WidgetKind::TextArea => "text_area",
            WidgetKind::NumberInput => "number_input",
            WidgetKind::Slider => "slider",
            WidgetKind::DateInput => "date_input",
        }
    }

    /// 单选类控件：URL 中保存选项序号而不是选项文本
    pub fn is_single_choice(&self) -> bool {
        matches!(self, WidgetKind::Radio | WidgetKind::Selectbox)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 同步键：(控件类型, 标签)
///
/// 会话存储按结构化的二元组区分控件；URL 参数名由二元组派生。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyncKey {
    pub kind: WidgetKind,
    pub label: String,
}

impl SyncKey {
    pub fn new(kind: WidgetKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }

    /// URL 参数名，例如 `checkbox_another?`
    pub fn param_name(&self) -> String {
        format!("{}_{}", self.kind.name(), self.label)
            .replace(' ', "_")
            .to_lowercase()
    }
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.label)
    }
}

/// 区间端点：数值或日期
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Number(f64),
    Date(NaiveDate),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// 控件取值（会话中保存的富类型）
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetValue {
    Bool(bool),
    Text(String),
    Number(f64),
    Date(NaiveDate),
    /// 单选控件选中的选项文本
    Choice(String),
    /// 多选控件选中的选项文本
    Choices(Vec<String>),
    /// 区间滑块的两个端点
    Pair(Scalar, Scalar),
}

impl From<Scalar> for WidgetValue {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Number(n) => WidgetValue::Number(n),
            Scalar::Date(d) => WidgetValue::Date(d),
        }
    }
}

impl fmt::Display for WidgetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetValue::Bool(b) => write!(f, "{}", b),
            WidgetValue::Text(s) | WidgetValue::Choice(s) => write!(f, "{}", s),
            WidgetValue::Number(n) => write!(f, "{}", n),
            WidgetValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            WidgetValue::Choices(vs) => write!(f, "[{}]", vs.join(", ")),
            WidgetValue::Pair(a, b) => write!(f, "({}, {})", a, b),
        }
    }
}

/// 控件描述（调用方传给控件构造函数的参数）
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub kind: WidgetKind,
    pub label: String,
    /// 单选 / 多选控件的选项
    pub options: Vec<String>,
    /// 调用方提供的初始值
    pub value: Option<WidgetValue>,
    /// 单选控件的默认选项序号
    pub index: Option<usize>,
    pub min_value: Option<Scalar>,
    pub max_value: Option<Scalar>,
}

impl WidgetSpec {
    pub fn new(kind: WidgetKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            options: Vec::new(),
            value: None,
            index: None,
            min_value: None,
            max_value: None,
        }
    }

    pub fn checkbox(label: impl Into<String>) -> Self {
        Self::new(WidgetKind::Checkbox, label)
    }

    pub fn radio<S: Into<String>>(
        label: impl Into<String>,
        options: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(WidgetKind::Radio, label).with_options(options)
    }

    pub fn selectbox<S: Into<String>>(
        label: impl Into<String>,
        options: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(WidgetKind::Selectbox, label).with_options(options)
    }

    pub fn multiselect<S: Into<String>>(
        label: impl Into<String>,
        options: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(WidgetKind::Multiselect, label).with_options(options)
    }

    pub fn text_input(label: impl Into<String>) -> Self {
        Self::new(WidgetKind::TextInput, label)
    }

    pub fn text_area(label: impl Into<String>) -> Self {
        Self::new(WidgetKind::TextArea, label)
    }

    pub fn number_input(label: impl Into<String>) -> Self {
        Self::new(WidgetKind::NumberInput, label)
    }

    pub fn slider(label: impl Into<String>) -> Self {
        Self::new(WidgetKind::Slider, label)
    }

    pub fn date_input(label: impl Into<String>) -> Self {
        Self::new(WidgetKind::DateInput, label)
    }

    pub fn with_options<S: Into<String>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_value(mut self, value: WidgetValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_range(mut self, min_value: Option<Scalar>, max_value: Option<Scalar>) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    pub fn sync_key(&self) -> SyncKey {
        SyncKey::new(self.kind, self.label.clone())
    }

    /// 初始值：优先使用调用方提供的值，否则按控件类型给出默认值
    pub fn initial_value(&self) -> WidgetValue {
        if let Some(value) = &self.value {
            return value.clone();
        }

        match self.kind {
            WidgetKind::Checkbox => WidgetValue::Bool(false),
            WidgetKind::Radio | WidgetKind::Selectbox => {
                let index = self.index.unwrap_or(0);
                WidgetValue::Choice(self.options.get(index).cloned().unwrap_or_default())
            }
            WidgetKind::Multiselect => WidgetValue::Choices(Vec::new()),
            WidgetKind::TextInput | WidgetKind::TextArea => WidgetValue::Text(String::new()),
            WidgetKind::NumberInput | WidgetKind::Slider => self
                .min_value
                .map(WidgetValue::from)
                .unwrap_or(WidgetValue::Number(0.0)),
            WidgetKind::DateInput => self
                .min_value
                .map(WidgetValue::from)
                .unwrap_or_else(|| WidgetValue::Date(Local::now().date_naive())),
        }
    }
}
