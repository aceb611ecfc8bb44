//! 短链接模块
//!
//! 把完整查询参数压缩为一个短哈希，并支持从短哈希还原

pub mod dao;
pub mod deploy;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use dao::ShortUrlDao;
pub use deploy::{DeploymentInfo, FixedBranch, GitBranch};
pub use models::{MissingHashPolicy, ShortUrlRecord, ShortenerConfig};
pub use service::{canonicalize, short_hash, ExpandOutcome, UrlShortener};
