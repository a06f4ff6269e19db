use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use road_code_scraper::store::{ChapterStore, SqliteChapterStore};
use road_code_scraper::utils::logging;
use road_code_scraper::{App, AppError, Config};

/// 抓取互动道路规则测验并写入 SQLite
#[derive(Parser, Debug)]
#[command(name = "road_code_scraper", version, about)]
struct Cli {
    /// 显示浏览器窗口（默认无头）
    #[arg(long)]
    headed: bool,

    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 数据库路径
    #[arg(long)]
    db: Option<PathBuf>,

    /// 只处理这些章节 URL（可重复），不再从列表页发现
    #[arg(long = "url")]
    urls: Vec<String>,

    /// 列出已入库的章节后退出
    #[arg(long)]
    list: bool,

    /// 输出 debug 日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    // 初始化日志
    logging::init(&config.log_dir, cli.verbose)?;

    if cli.list {
        return list_chapters(&config);
    }

    // Ctrl+C 时停止在当前章节
    let cancel = CancellationToken::new();
    let listener = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到 Ctrl+C，正在停止...");
            listener.cancel();
        }
    });

    let urls = (!cli.urls.is_empty()).then_some(cli.urls);

    // 初始化并运行应用
    let report = App::initialize(config).await?.run(urls, &cancel).await?;

    if report.is_cancelled() {
        return Err(AppError::Cancelled.into());
    }
    if !report.failed.is_empty() {
        warn!("⚠️ {} 个章节处理失败，重新运行会自动跳过已保存的章节", report.failed.len());
    }
    Ok(())
}

fn list_chapters(config: &Config) -> Result<()> {
    let store = SqliteChapterStore::open(&config.db_path)?;
    let chapters = store.list_chapters()?;
    if chapters.is_empty() {
        info!("📭 数据库中还没有章节");
        return Ok(());
    }
    for chapter in &chapters {
        info!(
            "📖 [{}] {} - {} 道题",
            chapter.id, chapter.title, chapter.question_count
        );
    }
    info!("共 {} 个章节", chapters.len());
    Ok(())
}
