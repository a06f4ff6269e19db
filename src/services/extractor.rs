//! 结构化提取 - 业务能力层
//!
//! 三种提取：列表页上的章节链接、章节页内嵌的 JSON、结果页的解析卡片。

use std::sync::{Arc, OnceLock};

use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Selectors};
use crate::error::{ConfigError, ExtractionError};
use crate::infrastructure::Document;
use crate::models::{Answer, Chapter, Question, RawAnswer, RawChapter, RawQuestion};
use crate::services::image_fetcher::ImageFetcher;

fn chapter_json_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"window\._rrltModuleContent\s*=\s*").expect("hard-coded regex is valid")
    })
}

fn leading_number() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"\d+").expect("hard-coded regex is valid"))
}

/// 从页面源码中取出章节 JSON 并解析
///
/// 从赋值语句之后开始按 JSON 流解析第一个值，字符串里出现 `};` 也不会截断。
pub fn parse_chapter_source(source: &str) -> Result<RawChapter, ExtractionError> {
    let marker = chapter_json_marker()
        .find(source)
        .ok_or(ExtractionError::MissingChapterJson)?;
    let rest = &source[marker.end()..];
    if !rest.starts_with('{') {
        return Err(ExtractionError::MissingChapterJson);
    }
    let mut de = serde_json::Deserializer::from_str(rest);
    RawChapter::deserialize(&mut de).map_err(|source| ExtractionError::InvalidChapterJson { source })
}

/// 相对路径基于站点根地址解析，已经是绝对地址的原样返回
pub fn resolve_url(base: &Url, reference: &str) -> Option<String> {
    base.join(reference.trim()).ok().map(String::from)
}

/// 每个非空分组取最后一个条目的链接
pub fn select_chapter_links(groups: &[Vec<Option<String>>], base: &Url) -> Vec<String> {
    groups
        .iter()
        .filter_map(|entries| entries.last())
        .filter_map(|href| href.as_deref())
        .filter(|href| !href.trim().is_empty())
        .filter_map(|href| resolve_url(base, href))
        .collect()
}

/// 拼接一张卡片里非空的解析段落
pub fn join_explanation_parts<'a>(parts: impl IntoIterator<Item = &'a Option<String>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_answers(raw_answers: &[RawAnswer]) -> Vec<Answer> {
    raw_answers
        .iter()
        .map(|a| Answer {
            id: a.id,
            answer: a.answer.clone(),
            is_correct_answer: a.correct,
            explanation: None,
        })
        .collect()
}

/// 结构化提取器
pub struct Extractor {
    document: Arc<dyn Document>,
    fetcher: ImageFetcher,
    base_url: Url,
    selectors: Selectors,
    image_concurrency: usize,
}

impl Extractor {
    pub fn new(
        document: Arc<dyn Document>,
        fetcher: ImageFetcher,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidUrl {
            value: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            document,
            fetcher,
            base_url,
            selectors: config.selectors.clone(),
            image_concurrency: config.network.image_concurrency.max(1),
        })
    }

    /// 列表页：找出所有章节的测试链接
    pub async fn discover_chapter_urls(&self) -> Result<Vec<String>, ExtractionError> {
        let groups = self
            .document
            .links_in_groups(&self.selectors.link_group, &self.selectors.link_entry)
            .await?;
        debug!("找到 {} 个链接分组", groups.len());

        let urls = select_chapter_links(&groups, &self.base_url);
        if urls.is_empty() {
            warn!("⚠️ 没有提取到任何章节链接，请检查页面结构和选择器");
        } else {
            info!("✓ 提取到 {} 个章节链接", urls.len());
        }
        Ok(urls)
    }

    /// 章节页：解析内嵌 JSON 并下载题目图片
    pub async fn extract_chapter(&self) -> Result<Chapter, ExtractionError> {
        let source = self.document.source().await?;
        let raw = parse_chapter_source(&source).map_err(|e| {
            error!("❌ 章节 JSON 提取失败: {}", e);
            e
        })?;
        debug!("章节 JSON 解析成功，共 {} 道题", raw.questions.len());

        let questions = stream::iter(raw.questions.iter())
            .map(|q| self.build_question(q))
            .buffered(self.image_concurrency)
            .collect::<Vec<_>>()
            .await;

        let chapter = Chapter {
            id: raw.id,
            title: raw.title,
            intro: raw.intro,
            questions,
        };
        info!(
            "✓ 提取章节 '{}' (ID: {})，{} 道题",
            chapter.title,
            chapter.id,
            chapter.questions.len()
        );
        Ok(chapter)
    }

    async fn build_question(&self, raw: &RawQuestion) -> Question {
        let image_url = raw
            .image_path()
            .and_then(|path| resolve_url(&self.base_url, path));

        let image_base64 = match &image_url {
            Some(url) => match self.fetcher.fetch_base64(url).await {
                Ok(encoded) => Some(encoded),
                Err(e) => {
                    // 图片失败不影响整章
                    warn!("⚠️ 题目 {} 图片下载失败: {}", raw.id, e);
                    None
                }
            },
            None => None,
        };

        let answers = build_answers(&raw.answers);
        if !answers.is_empty() && !answers.iter().any(|a| a.is_correct_answer) {
            warn!("⚠️ 题目 {} 没有标记正确答案", raw.id);
        }

        Question {
            id: raw.id,
            question: raw.question.clone(),
            image_url,
            image_base64,
            answers,
        }
    }

    /// 结果页：按卡片顺序取出每道题的解析
    pub async fn extract_explanations(&self) -> Result<Vec<String>, ExtractionError> {
        let parts = vec![
            self.selectors.card_question_number.clone(),
            self.selectors.explanation_main.clone(),
            self.selectors.explanation_additional.clone(),
        ];
        let cards = self
            .document
            .texts_in_cards(&self.selectors.result_card, &parts)
            .await?;

        if cards.is_empty() {
            error!("❌ 结果页没有解析卡片: {}", self.selectors.result_card);
            return Err(ExtractionError::MissingResultCards {
                selector: self.selectors.result_card.clone(),
            });
        }
        debug!("找到 {} 张解析卡片", cards.len());

        let explanations: Vec<String> = cards
            .iter()
            .enumerate()
            .map(|(index, card)| {
                check_card_position(index, card.first().and_then(|n| n.as_deref()));
                join_explanation_parts(card.iter().skip(1))
            })
            .collect();

        info!("✓ 提取到 {} 条解析", explanations.len());
        Ok(explanations)
    }
}

/// 卡片上显示的题号和位置对不上时告警（合并只按位置对齐）
fn check_card_position(index: usize, number_text: Option<&str>) -> bool {
    let Some(text) = number_text else {
        return true;
    };
    let Some(number) = leading_number()
        .find(text)
        .and_then(|m| m.as_str().parse::<usize>().ok())
    else {
        return true;
    };
    if number != index + 1 {
        warn!(
            "⚠️ 第 {} 张解析卡片显示的题号是 {}，解析可能与题目错位",
            index + 1,
            number
        );
        return false;
    }
    true
}
