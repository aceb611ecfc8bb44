//! SQLite 数据库工具：统一创建连接池
//!
//! 表结构不走迁移，由各 DAO 在首次访问时按需创建（`CREATE TABLE IF NOT EXISTS`）。

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

/// 创建 SQLite 连接池，数据库文件不存在时自动创建
///
/// 内存数据库（`sqlite::memory:`）每个连接互相独立，因此只保留一个常驻连接。
pub async fn create_sqlite_pool(db_url: &str) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("无效的 SQLite 数据库地址: {}", db_url))?
        .create_if_missing(true);

    let pool_options = if is_memory_url(db_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("连接SQLite数据库失败: {}", db_url))?;

    info!("[DB] SQLite 连接池已创建: {}", db_url);
    Ok(pool)
}

fn is_memory_url(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}
