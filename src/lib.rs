pub mod db;
pub mod demo;
pub mod error;
pub mod shorten;
pub mod sync;

// 重新导出常用类型和函数，方便外部使用
pub use error::{DecodeError, ShortenError, SyncError};
pub use shorten::{ExpandOutcome, MissingHashPolicy, ShortenerConfig, UrlShortener};
pub use sync::{
    HeadlessRenderer, MemoryPage, Page, ParamMap, ParamValue, SessionState, UrlSynced,
    WidgetKind, WidgetSpec, WidgetValue,
};
