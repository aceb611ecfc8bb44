//! 短链接服务层
//!
//! 把完整的查询参数规范化为 JSON，取 MD5 摘要前缀作为短哈希，保存哈希到参数的映射；
//! 页面只带短哈希打开时，再把完整参数还原到 URL。

use crate::db::create_sqlite_pool;
use crate::error::ShortenError;
use crate::shorten::dao::ShortUrlDao;
use crate::shorten::deploy::{DeploymentInfo, GitBranch};
use crate::shorten::models::{
    MissingHashPolicy, ShortUrlRecord, ShortenerConfig, SHORT_HASH_PARAM,
};
use crate::sync::page::Page;
use crate::sync::params::{self, ParamMap};
use md5::{Digest, Md5};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 页面加载时展开短链接的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// 查询参数不是「只有一个 q」的形式
    NotShortLink,
    /// 已还原完整参数并请求重新渲染
    Expanded(ParamMap),
    /// 哈希不存在
    Missing(String),
}

/// 规范化：按键排序后序列化为 JSON
pub fn canonicalize(params: &ParamMap) -> Result<String, ShortenError> {
    Ok(serde_json::to_string(params)?)
}

/// 取 MD5 十六进制摘要的前 `length` 个字符
pub fn short_hash(data: &str, length: usize) -> String {
    let mut digest = hex::encode(Md5::digest(data.as_bytes()));
    digest.truncate(length);
    digest
}

/// 短链接服务
pub struct UrlShortener {
    config: ShortenerConfig,
    dao: ShortUrlDao,
    deployment: Arc<dyn DeploymentInfo>,
}

impl UrlShortener {
    /// 按配置连接数据库，以当前目录的 git 分支作为部署分支
    pub async fn new(config: ShortenerConfig) -> Result<Self, ShortenError> {
        let deployment = GitBranch::current_dir().map_err(ShortenError::Deployment)?;
        Self::with_deployment(config, Arc::new(deployment)).await
    }

    /// 按配置连接数据库（自定义部署信息）
    pub async fn with_deployment(
        config: ShortenerConfig,
        deployment: Arc<dyn DeploymentInfo>,
    ) -> Result<Self, ShortenError> {
        info!("[Shortener] 创建短链接服务，SQLite数据库: {}", config.db_url);
        let db = create_sqlite_pool(&config.db_url).await?;
        Ok(Self::with_dao(config, ShortUrlDao::new(db), deployment))
    }

    /// 使用已有的 DAO 创建（共享连接池）
    pub fn with_dao(
        config: ShortenerConfig,
        dao: ShortUrlDao,
        deployment: Arc<dyn DeploymentInfo>,
    ) -> Self {
        Self {
            config,
            dao,
            deployment,
        }
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    /// 对序列化结果取短哈希
    pub fn hash(&self, serialized: &str) -> String {
        short_hash(serialized, self.config.hash_length)
    }

    /// 参数映射的短哈希
    pub fn hash_params(&self, params: &ParamMap) -> Result<String, ShortenError> {
        Ok(self.hash(&canonicalize(params)?))
    }

    /// 保存参数映射（已存在则跳过），返回短哈希
    pub async fn ensure_stored(&self, params: &ParamMap) -> Result<String, ShortenError> {
        let serialized = canonicalize(params)?;
        let hash = self.hash(&serialized);

        let inserted = self
            .dao
            .insert_if_absent(&ShortUrlRecord {
                hash: hash.clone(),
                params: serialized,
            })
            .await?;
        if inserted {
            info!("[Shortener] 新增短链接 {}，参数 {} 个", hash, params.len());
        } else {
            debug!("[Shortener] 短链接 {} 已存在", hash);
        }
        Ok(hash)
    }

    /// 按哈希还原参数映射
    pub async fn expand(&self, hash: &str) -> Result<ParamMap, ShortenError> {
        let serialized = self
            .dao
            .get_params(hash)
            .await?
            .ok_or_else(|| ShortenError::NotFound(hash.to_string()))?;
        Ok(serde_json::from_str(&serialized)?)
    }

    pub async fn contains(&self, hash: &str) -> Result<bool, ShortenError> {
        Ok(self.dao.contains(hash).await?)
    }

    /// 全部映射记录
    pub async fn records(&self) -> Result<Vec<ShortUrlRecord>, ShortenError> {
        Ok(self.dao.get_all().await?)
    }

    /// 生成短链接：`{base_url}?q={hash}`
    pub async fn build_short_link(&self, hash: &str) -> Result<String, ShortenError> {
        let branch = self
            .deployment
            .current_branch()
            .await
            .map_err(ShortenError::Deployment)?;
        let base_url = self.config.base_url_for_branch(&branch);
        let query = serde_urlencoded::to_string(&[(SHORT_HASH_PARAM, hash)])?;
        Ok(format!("{}?{}", base_url, query))
    }

    /// 「获取短链接」动作：保存当前页面的全部参数，并在页面上展示短链接
    pub async fn get_short_url(&self, page: &mut dyn Page) -> Result<String, ShortenError> {
        let params = params::collapse(&page.query_params());
        let hash = self.ensure_stored(&params).await?;
        let url = self.build_short_link(&hash).await?;
        page.write(&url);
        Ok(url)
    }

    /// 页面加载时调用：URL 只带短哈希时还原完整参数
    pub async fn expand_short_url(
        &self,
        page: &mut dyn Page,
    ) -> Result<ExpandOutcome, ShortenError> {
        let raw = page.query_params();
        if raw.len() != 1 {
            return Ok(ExpandOutcome::NotShortLink);
        }
        let Some(hash) = raw
            .get(SHORT_HASH_PARAM)
            .and_then(|values| values.first())
            .cloned()
        else {
            return Ok(ExpandOutcome::NotShortLink);
        };

        match self.expand(&hash).await {
            Ok(params) => {
                info!("[Shortener] 展开短链接 {}，参数 {} 个", hash, params.len());
                page.set_query_params(params::expand(&params));
                page.rerun();
                Ok(ExpandOutcome::Expanded(params))
            }
            Err(ShortenError::NotFound(hash)) => {
                match self.config.missing_hash_policy {
                    MissingHashPolicy::Report => {
                        warn!("[Shortener] 短链接不存在: {}", hash);
                        page.error(&format!("Invalid or expired short link: {}", hash));
                    }
                    MissingHashPolicy::Ignore => {
                        debug!("[Shortener] 短链接不存在，忽略: {}", hash);
                    }
                }
                Ok(ExpandOutcome::Missing(hash))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shorten::deploy::FixedBranch;
    use crate::sync::page::MemoryPage;
    use crate::sync::params::ParamValue;
    use std::sync::Once;

    static INIT_LOGGER: Once = Once::new();

    fn init_test_logger() {
        INIT_LOGGER.call_once(|| {
            use tracing_subscriber::prelude::*;
            use tracing_subscriber::EnvFilter;

            let filter_layer = EnvFilter::new("info,widget_url_sync=debug,sqlx=warn");

            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_test_writer();

            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt_layer)
                .init();
        });
    }

    async fn memory_shortener(branch: &str, policy: MissingHashPolicy) -> UrlShortener {
        init_test_logger();
        let mut config = ShortenerConfig::new().with_db_url("sqlite::memory:");
        config.missing_hash_policy = policy;
        UrlShortener::with_deployment(config, Arc::new(FixedBranch(branch.to_string())))
            .await
            .unwrap()
    }

    fn sample_params() -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("q1".into(), ParamValue::from("true"));
        params.insert("q2".into(), ParamValue::from("2"));
        params
    }

    #[test]
    fn test_hash_is_md5_prefix() {
        assert_eq!(short_hash("", 10), "d41d8cd98f");
        assert_eq!(short_hash("", 32), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(short_hash("", 64).len(), 32);
    }

    #[test]
    fn test_canonicalize_ignores_insertion_order() {
        let mut a = ParamMap::new();
        a.insert("z".into(), ParamValue::from("1"));
        a.insert("a".into(), ParamValue::Multi(vec!["x".into(), "y".into()]));
        let mut b = ParamMap::new();
        b.insert("a".into(), ParamValue::Multi(vec!["x".into(), "y".into()]));
        b.insert("z".into(), ParamValue::from("1"));

        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
        assert_eq!(
            short_hash(&canonicalize(&a).unwrap(), 10),
            short_hash(&canonicalize(&b).unwrap(), 10)
        );
    }

    #[tokio::test]
    async fn test_ensure_stored_is_idempotent() {
        let shortener = memory_shortener("main", MissingHashPolicy::Report).await;
        let params = sample_params();

        let first = shortener.ensure_stored(&params).await.unwrap();
        let second = shortener.ensure_stored(&params).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(shortener.records().await.unwrap().len(), 1);
        assert_eq!(shortener.expand(&first).await.unwrap(), params);
    }

    #[tokio::test]
    async fn test_expand_unknown_hash_is_not_found() {
        let shortener = memory_shortener("main", MissingHashPolicy::Report).await;

        let err = shortener.expand("doesnotexist").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!shortener.contains("doesnotexist").await.unwrap());
    }

    #[tokio::test]
    async fn test_short_link_uses_branch_suffix() {
        let main = memory_shortener("main", MissingHashPolicy::Report).await;
        assert_eq!(
            main.build_short_link("0123456789").await.unwrap(),
            "https://widget-url-sync.run.app?q=0123456789"
        );

        let dev = memory_shortener("dev", MissingHashPolicy::Report).await;
        assert_eq!(
            dev.build_short_link("0123456789").await.unwrap(),
            "https://widget-url-sync-dev.run.app?q=0123456789"
        );
    }

    #[tokio::test]
    async fn test_expand_short_url_restores_page() {
        let shortener = memory_shortener("main", MissingHashPolicy::Report).await;
        let hash = shortener.ensure_stored(&sample_params()).await.unwrap();

        let mut page = MemoryPage::from_query_string(&format!("q={}", hash)).unwrap();
        let outcome = shortener.expand_short_url(&mut page).await.unwrap();

        assert_eq!(outcome, ExpandOutcome::Expanded(sample_params()));
        assert_eq!(page.query_string().unwrap(), "q1=true&q2=2");
        assert!(page.take_rerun());
    }

    #[tokio::test]
    async fn test_expand_short_url_missing_policy() {
        let report = memory_shortener("main", MissingHashPolicy::Report).await;
        let mut page = MemoryPage::from_query_string("q=deadbeef00").unwrap();
        assert_eq!(
            report.expand_short_url(&mut page).await.unwrap(),
            ExpandOutcome::Missing("deadbeef00".into())
        );
        assert_eq!(page.errors(), ["Invalid or expired short link: deadbeef00"]);
        assert_eq!(page.query_string().unwrap(), "q=deadbeef00");
        assert!(!page.take_rerun());

        let ignore = memory_shortener("main", MissingHashPolicy::Ignore).await;
        let mut page = MemoryPage::from_query_string("q=deadbeef00").unwrap();
        assert_eq!(
            ignore.expand_short_url(&mut page).await.unwrap(),
            ExpandOutcome::Missing("deadbeef00".into())
        );
        assert!(page.errors().is_empty());
    }

    #[tokio::test]
    async fn test_expand_short_url_ignores_other_pages() {
        let shortener = memory_shortener("main", MissingHashPolicy::Report).await;

        for query in ["", "q=abc&q1=true", "checkbox_c=true"] {
            let mut page = MemoryPage::from_query_string(query).unwrap();
            assert_eq!(
                shortener.expand_short_url(&mut page).await.unwrap(),
                ExpandOutcome::NotShortLink
            );
            assert!(page.errors().is_empty());
        }
    }

    #[tokio::test]
    async fn test_get_short_url_writes_link() {
        let shortener = memory_shortener("main", MissingHashPolicy::Report).await;
        let mut page =
            MemoryPage::from_query_string("q1=true&q2=2&fruit=Apple&fruit=Banana").unwrap();

        let url = shortener.get_short_url(&mut page).await.unwrap();
        assert_eq!(page.output(), [url.clone()]);

        let hash = url.rsplit("q=").next().unwrap();
        let restored = shortener.expand(hash).await.unwrap();
        assert_eq!(
            restored.get("fruit"),
            Some(&ParamValue::Multi(vec!["Apple".into(), "Banana".into()]))
        );
    }
}
