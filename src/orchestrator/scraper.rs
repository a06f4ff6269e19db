//! 批量章节处理器 - 编排层
//!
//! 导航严格串行：同一时间只有一个章节在使用页面。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, ConfigError};
use crate::infrastructure::Document;
use crate::services::{Extractor, ImageFetcher, PageHandler};
use crate::store::ChapterStore;
use crate::utils::logging::log_chapter_start;
use crate::workflow::{ChapterFlow, ChapterOutcome};

/// 一次批量运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// 计划处理的章节数
    pub total: usize,
    /// 新写入的章节 ID
    pub persisted: Vec<i64>,
    /// 已入库而跳过的章节 ID
    pub skipped_existing: Vec<i64>,
    /// 没有题目的章节 URL
    pub skipped_empty: Vec<String>,
    /// (URL, 错误信息)
    pub failed: Vec<(String, String)>,
    /// 因取消而没有完成的章节 URL
    pub cancelled: Vec<String>,
}

impl BatchReport {
    pub fn is_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }
}

/// 批量章节处理器
pub struct Scraper {
    pages: PageHandler,
    extractor: Extractor,
    store: Box<dyn ChapterStore>,
}

impl Scraper {
    pub fn new(
        document: Arc<dyn Document>,
        fetcher: ImageFetcher,
        store: Box<dyn ChapterStore>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            pages: PageHandler::new(document.clone(), config),
            extractor: Extractor::new(document, fetcher, config)?,
            store,
        })
    }

    pub fn store(&self) -> &dyn ChapterStore {
        self.store.as_ref()
    }

    /// 处理所有章节
    ///
    /// `urls` 为 `None` 时先打开列表页发现章节链接。列表页或发现阶段失败
    /// 直接返回错误；单个章节失败只记入报告。
    pub async fn run(
        &self,
        urls: Option<Vec<String>>,
        cancel: &CancellationToken,
    ) -> AppResult<BatchReport> {
        let urls = match urls {
            Some(urls) => {
                info!("📋 使用指定的 {} 个章节 URL", urls.len());
                urls
            }
            None => self.discover().await?,
        };

        let mut report = BatchReport {
            total: urls.len(),
            ..Default::default()
        };

        for (index, url) in urls.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("🛑 已取消，剩余 {} 个章节未处理", urls.len() - index);
                report.cancelled.extend(urls[index..].iter().cloned());
                break;
            }

            log_chapter_start(index + 1, urls.len(), url);
            let flow = ChapterFlow::new(&self.pages, &self.extractor, self.store.as_ref());

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = flow.run(url) => Some(result),
            };

            match result {
                None => {
                    warn!("🛑 章节处理中被取消: {}", url);
                    report.cancelled.extend(urls[index..].iter().cloned());
                    break;
                }
                Some(Ok(ChapterOutcome::Persisted { id, .. })) => report.persisted.push(id),
                Some(Ok(ChapterOutcome::AlreadyExists { id })) => report.skipped_existing.push(id),
                Some(Ok(ChapterOutcome::Empty)) => report.skipped_empty.push(url.clone()),
                Some(Err(e)) => {
                    error!("❌ {}", e);
                    report.failed.push((url.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn discover(&self) -> AppResult<Vec<String>> {
        self.pages.goto_landing().await?;
        self.pages.expand_sections().await?;
        let urls = self.extractor.discover_chapter_urls().await?;
        Ok(urls)
    }
}
