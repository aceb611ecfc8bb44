//! URL 参数同步 CLI
//!
//! 无界面地驱动示例页面，并提供短链接的生成、展开与列表功能

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use widget_url_sync::demo::{parse_change, run_example_page};
use widget_url_sync::shorten::{DeploymentInfo, FixedBranch, GitBranch};
use widget_url_sync::sync::params;
use widget_url_sync::{MemoryPage, MissingHashPolicy, SessionState, ShortenerConfig, UrlShortener};

/// URL 参数同步 CLI
#[derive(Parser, Debug)]
#[command(name = "url-sync-cli")]
#[command(about = "控件 / 会话 / URL 参数同步与短链接工具", long_about = None)]
struct Args {
    /// SQLite 数据库 URL
    #[arg(long, default_value = "sqlite://url_sync.db?mode=rwc")]
    db: String,

    /// 短哈希长度
    #[arg(long, default_value_t = widget_url_sync::shorten::models::DEFAULT_HASH_LENGTH)]
    hash_length: usize,

    /// 短链接基础地址模板（`{branch}` 替换为分支后缀）
    #[arg(long, default_value = widget_url_sync::shorten::models::DEFAULT_BASE_URL)]
    base_url: String,

    /// 部署分支（默认读取当前目录的 git 分支）
    #[arg(long)]
    branch: Option<String>,

    /// 短链接不存在时不在页面上提示
    #[arg(long)]
    ignore_missing: bool,

    /// 日志级别（默认: info,widget_url_sync=debug）
    #[arg(long, default_value = "info,widget_url_sync=debug")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 保存查询串并输出短链接
    Shorten {
        /// 查询串，例如 `q1=true&q2=2`
        query: String,
    },
    /// 按短哈希输出完整查询串
    Expand { hash: String },
    /// 列出全部短链接映射
    List,
    /// 渲染示例页面
    Page {
        /// 页面打开时的查询串
        #[arg(long, default_value = "")]
        query: String,

        /// 控件变更，`URL参数名=取值`，可重复
        #[arg(long = "set", value_name = "NAME=VALUE")]
        changes: Vec<String>,

        /// 渲染后生成短链接
        #[arg(long)]
        shorten: bool,
    },
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("url-sync.log")
        .context("无法创建日志文件 url-sync.log")?;

    // 控制台输出到 stderr，stdout 只留给命令结果
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    let config = ShortenerConfig {
        db_url: args.db.clone(),
        hash_length: args.hash_length,
        base_url: args.base_url.clone(),
        missing_hash_policy: if args.ignore_missing {
            MissingHashPolicy::Ignore
        } else {
            MissingHashPolicy::Report
        },
        ..ShortenerConfig::new()
    };
    let deployment: Arc<dyn DeploymentInfo> = match &args.branch {
        Some(branch) => Arc::new(FixedBranch(branch.clone())),
        None => Arc::new(GitBranch::current_dir().map_err(|e| anyhow!(e))?),
    };
    let shortener = UrlShortener::with_deployment(config, deployment).await?;

    match args.command {
        Command::Shorten { query } => {
            let raw = params::parse_query_string(&query).context("无效的查询串")?;
            let hash = shortener.ensure_stored(&params::collapse(&raw)).await?;
            println!("{}", shortener.build_short_link(&hash).await?);
        }
        Command::Expand { hash } => {
            let expanded = shortener.expand(&hash).await?;
            println!("{}", params::to_query_string(&params::expand(&expanded))?);
        }
        Command::List => {
            let records = shortener.records().await?;
            info!("[CLI] 共 {} 条短链接映射", records.len());
            for record in records {
                println!("{}\t{}", record.hash, record.params);
            }
        }
        Command::Page {
            query,
            changes,
            shorten,
        } => {
            let changes = changes
                .iter()
                .map(|change| parse_change(change))
                .collect::<Result<Vec<_>, _>>()?;
            let mut page = MemoryPage::from_query_string(&query).context("无效的查询串")?;
            let mut session = SessionState::new();

            let report =
                run_example_page(&shortener, &mut session, &mut page, &changes, shorten).await?;

            for error in page.errors() {
                eprintln!("error: {}", error);
            }
            for (key, value) in &report.values {
                println!("{} = {}", key.param_name(), value);
            }
            println!("?{}", page.query_string()?);
            if let Some(url) = report.short_url {
                println!("{}", url);
            }
        }
    }

    Ok(())
}
