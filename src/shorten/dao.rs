//! 短链接数据访问层（DAO）
//!
//! 负责 `url_table` 的建表、写入与查询。表在首次访问时创建，只追加、不更新不删除。

use crate::shorten::models::ShortUrlRecord;
use anyhow::{Context, Result};
use sqlx::{Pool, Row, Sqlite};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// 短链接 DAO（基于 sqlx）
pub struct ShortUrlDao {
    db: Pool<Sqlite>,
    table_ready: OnceCell<()>,
}

impl ShortUrlDao {
    /// 创建新的短链接 DAO
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self {
            db,
            table_ready: OnceCell::new(),
        }
    }

    /// 初始化数据库表结构（幂等）
    pub async fn init_db(&self) -> Result<()> {
        self.table_ready
            .get_or_try_init(|| Self::init_db_with_connection(&self.db))
            .await?;
        Ok(())
    }

    /// 使用共享连接初始化数据库表结构（静态方法）
    pub async fn init_db_with_connection(db: &Pool<Sqlite>) -> Result<()> {
        info!("[ShortUrlDAO/DB] 初始化短链接映射表");

        let sql = r#"
            CREATE TABLE IF NOT EXISTS url_table (
                hash TEXT PRIMARY KEY,
                params TEXT
            )
        "#;
        sqlx::query(sql)
            .execute(db)
            .await
            .context("创建短链接映射表失败")?;
        Ok(())
    }

    /// 按哈希查询参数 JSON
    pub async fn get_params(&self, hash: &str) -> Result<Option<String>> {
        self.init_db().await?;

        let row = sqlx::query(
            r#"
            SELECT params FROM url_table WHERE hash = ?
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.db)
        .await
        .context("查询短链接映射失败")?;

        Ok(row.map(|m| m.get::<Option<String>, _>("params").unwrap_or_default()))
    }

    /// 哈希是否已存在
    pub async fn contains(&self, hash: &str) -> Result<bool> {
        self.init_db().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM url_table WHERE hash = ?")
            .bind(hash)
            .fetch_one(&self.db)
            .await
            .context("查询短链接是否存在失败")?;
        Ok(count > 0)
    }

    /// 不存在时插入，返回是否真正写入了新行
    ///
    /// 使用 `INSERT OR IGNORE`，检查与写入在同一条语句内完成。
    pub async fn insert_if_absent(&self, record: &ShortUrlRecord) -> Result<bool> {
        self.init_db().await?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO url_table (hash, params) VALUES (?, ?)
            "#,
        )
        .bind(&record.hash)
        .bind(&record.params)
        .execute(&self.db)
        .await
        .context("写入短链接映射失败")?;

        let inserted = result.rows_affected() > 0;
        debug!(
            "[ShortUrlDAO] 写入短链接 {}，新增: {}",
            record.hash, inserted
        );
        Ok(inserted)
    }

    /// 获取全部映射记录
    pub async fn get_all(&self) -> Result<Vec<ShortUrlRecord>> {
        self.init_db().await?;

        let rows = sqlx::query(
            r#"
            SELECT hash, params FROM url_table ORDER BY hash
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("查询短链接映射列表失败")?;

        let records: Vec<ShortUrlRecord> = rows
            .into_iter()
            .map(|m| ShortUrlRecord {
                hash: m.get("hash"),
                params: m.get::<Option<String>, _>("params").unwrap_or_default(),
            })
            .collect();

        debug!("[ShortUrlDAO] 获取短链接映射列表，共 {} 条", records.len());
        Ok(records)
    }
}
