//! 章节处理流程 - 流程层
//!
//! 核心职责：定义"一个章节"的完整处理流程
//!
//! 流程顺序：
//! 1. 打开章节页 → 提取内嵌 JSON（含图片）
//! 2. 空章节 / 已入库 → 跳过
//! 3. 模拟答题：Start → 每题选一个选项 → Next / Finish
//! 4. 展开结果页 → 提取解析 → 合并到正确答案
//! 5. 整章写入存储

use tracing::{debug, info, warn};

use crate::error::{AppResult, SimulationError};
use crate::models::Chapter;
use crate::services::{merge_explanations, Extractor, PageHandler};
use crate::store::ChapterStore;
use crate::utils::truncate_text;

/// 单个章节已经到达的状态，出错时随错误一起上报
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterState {
    Start,
    NavigatedToChapter,
    Extracted,
    /// 已确认未入库
    SkipIfExists,
    Simulated,
    ResultsOpened,
    ExplanationsMerged,
    Persisted,
}

/// 单个章节的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// 新写入
    Persisted { id: i64, title: String },
    /// 之前已入库，没有模拟答题
    AlreadyExists { id: i64 },
    /// 章节没有题目
    Empty,
}

/// 章节处理流程
///
/// - 决定每一步的先后顺序
/// - 不持有任何资源，只借用编排层的服务和存储
pub struct ChapterFlow<'a> {
    pages: &'a PageHandler,
    extractor: &'a Extractor,
    store: &'a dyn ChapterStore,
}

impl<'a> ChapterFlow<'a> {
    pub fn new(
        pages: &'a PageHandler,
        extractor: &'a Extractor,
        store: &'a dyn ChapterStore,
    ) -> Self {
        Self {
            pages,
            extractor,
            store,
        }
    }

    /// 处理一个章节，失败时错误里带上 URL 和最后到达的状态
    pub async fn run(&self, url: &str) -> AppResult<ChapterOutcome> {
        let mut state = ChapterState::Start;
        self.run_steps(url, &mut state)
            .await
            .map_err(|e| e.in_chapter(url, state))
    }

    async fn run_steps(&self, url: &str, state: &mut ChapterState) -> AppResult<ChapterOutcome> {
        self.pages.goto_chapter(url).await?;
        *state = ChapterState::NavigatedToChapter;

        let chapter = self.extractor.extract_chapter().await?;
        *state = ChapterState::Extracted;

        if chapter.questions.is_empty() {
            warn!("⚠️ 章节 '{}' 没有题目，跳过: {}", chapter.title, url);
            return Ok(ChapterOutcome::Empty);
        }

        if self.store.exists(chapter.id)? {
            info!("⏭️ 章节 '{}' (ID: {}) 已入库，跳过", chapter.title, chapter.id);
            return Ok(ChapterOutcome::AlreadyExists { id: chapter.id });
        }
        *state = ChapterState::SkipIfExists;

        self.simulate(&chapter).await?;
        *state = ChapterState::Simulated;

        self.pages.open_results_panel().await?;
        *state = ChapterState::ResultsOpened;

        let explanations = self.extractor.extract_explanations().await?;
        let merged = merge_explanations(&chapter, &explanations);
        *state = ChapterState::ExplanationsMerged;

        if !self.store.insert(&merged)? {
            return Ok(ChapterOutcome::AlreadyExists { id: merged.id });
        }
        *state = ChapterState::Persisted;

        info!(
            "💾 章节 '{}' (ID: {}) 已保存: {} 道题, {} 个选项",
            merged.title,
            merged.id,
            merged.questions.len(),
            merged.answer_count()
        );
        Ok(ChapterOutcome::Persisted {
            id: merged.id,
            title: merged.title,
        })
    }

    /// 模拟答完整套题，让结果页展示全部解析
    async fn simulate(&self, chapter: &Chapter) -> AppResult<()> {
        self.pages.start_test().await?;

        let total = chapter.questions.len();
        for (index, question) in chapter.questions.iter().enumerate() {
            let (answer, fallback) = question
                .answer_to_click()
                .ok_or(SimulationError::NoAnswers {
                    question_id: question.id,
                })?;
            if fallback {
                warn!(
                    "⚠️ 题目 {} 没有错误选项，改选第一个选项",
                    question.id
                );
            }

            debug!(
                "[{}/{}] {} → {}",
                index + 1,
                total,
                truncate_text(&question.question, 40),
                truncate_text(&answer.answer, 30)
            );
            self.pages.click_answer(&answer.answer).await?;

            if index + 1 < total {
                self.pages.next_question().await?;
            } else {
                self.pages.finish_test().await?;
            }
        }
        Ok(())
    }
}
