//! 应用入口 - 编排层
//!
//! 唯一持有浏览器会话的模块。`run` 结束时（无论成功、失败还是取消）
//! 都会关闭浏览器。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::{AppResult, BrowserError};
use crate::infrastructure::{ChromeDocument, Document};
use crate::orchestrator::scraper::{BatchReport, Scraper};
use crate::services::ImageFetcher;
use crate::store::SqliteChapterStore;
use crate::utils::logging::{log_file_path, log_startup, print_final_report};

/// 应用主结构
pub struct App {
    config: Config,
    session: BrowserSession,
    scraper: Scraper,
}

impl App {
    /// 初始化应用：打开数据库、启动浏览器
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let store = SqliteChapterStore::open(&config.db_path)?;
        let fetcher = ImageFetcher::http(&config.network)?;
        let session = BrowserSession::launch(&config.browser).await?;

        let page = match session.page().cloned() {
            Some(page) => page,
            None => {
                session.close().await;
                return Err(BrowserError::ConfigurationFailed("页面未创建".to_string()).into());
            }
        };
        let document: Arc<dyn Document> = Arc::new(ChromeDocument::new(page));

        let scraper = match Scraper::new(document, fetcher, Box::new(store), &config) {
            Ok(scraper) => scraper,
            Err(e) => {
                session.close().await;
                return Err(e.into());
            }
        };

        Ok(Self {
            config,
            session,
            scraper,
        })
    }

    /// 运行应用主逻辑，返回前关闭浏览器
    pub async fn run(
        self,
        urls: Option<Vec<String>>,
        cancel: &CancellationToken,
    ) -> AppResult<BatchReport> {
        let Self {
            config,
            session,
            scraper,
        } = self;

        let result = scraper.run(urls, cancel).await;
        drop(scraper);
        session.close().await;

        match &result {
            Ok(report) => print_final_report(report, &log_file_path(&config.log_dir)),
            Err(e) => error!("❌ 运行失败: {}", e),
        }
        result
    }
}
