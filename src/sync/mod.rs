//! 参数同步模块
//!
//! 控件取值、会话状态与页面 URL 查询参数之间的双向同步

pub mod codec;
pub mod page;
pub mod params;
pub mod session;
pub mod synced;
pub mod widget;

// 重新导出主要类型
pub use page::{HeadlessRenderer, MemoryPage, Page, WidgetRenderer};
pub use params::{ParamMap, ParamValue, RawQueryParams};
pub use session::SessionState;
pub use synced::{OnChange, UrlSynced};
pub use widget::{Scalar, SyncKey, WidgetKind, WidgetSpec, WidgetValue};
