//! 短链接模型与配置

use serde::{Deserialize, Serialize};

/// 短链接映射表名
pub const URL_TABLE: &str = "url_table";

/// 默认哈希长度
pub const DEFAULT_HASH_LENGTH: usize = 10;

/// 短链接中保存哈希的查询参数名
pub const SHORT_HASH_PARAM: &str = "q";

/// 短链接基础地址模板，`{branch}` 会被替换为分支后缀
pub const DEFAULT_BASE_URL: &str = "https://widget-url-sync{branch}.run.app";

/// 短链接映射记录：哈希 -> 参数映射的规范化 JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrlRecord {
    pub hash: String,
    pub params: String,
}

/// 短链接不存在时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingHashPolicy {
    /// 在页面上提示「短链接无效或已失效」
    #[default]
    Report,
    /// 只记录日志，页面保持原样
    Ignore,
}

/// 短链接服务配置
#[derive(Debug, Clone)]
pub struct ShortenerConfig {
    /// SQLite 数据库 URL，例如 `sqlite://url_sync.db?mode=rwc`
    pub db_url: String,
    /// 哈希长度（MD5 十六进制摘要的前缀长度，最长 32）
    pub hash_length: usize,
    /// 短链接基础地址模板
    pub base_url: String,
    /// 主分支名，主分支的短链接不带分支后缀
    pub main_branch: String,
    pub missing_hash_policy: MissingHashPolicy,
}

impl ShortenerConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self {
            db_url: "sqlite://url_sync.db?mode=rwc".to_string(),
            hash_length: DEFAULT_HASH_LENGTH,
            base_url: DEFAULT_BASE_URL.to_string(),
            main_branch: "main".to_string(),
            missing_hash_policy: MissingHashPolicy::Report,
        }
    }

    pub fn with_db_url(mut self, db_url: impl Into<String>) -> Self {
        self.db_url = db_url.into();
        self
    }

    /// 按分支生成基础地址：主分支无后缀，其他分支为 `-{branch}`
    pub fn base_url_for_branch(&self, branch: &str) -> String {
        let suffix = if branch == self.main_branch {
            String::new()
        } else {
            format!("-{}", branch)
        };
        self.base_url.replace("{branch}", &suffix)
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_for_branch() {
        let config = ShortenerConfig::new();
        assert_eq!(
            config.base_url_for_branch("main"),
            "https://widget-url-sync.run.app"
        );
        assert_eq!(
            config.base_url_for_branch("feature"),
            "https://widget-url-sync-feature.run.app"
        );
    }
}
