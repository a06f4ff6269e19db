//! 页面交互协议 - 业务能力层
//!
//! 站点上每一个用户动作（打开列表页、展开分组、开始测试、选答案、下一题、
//! 完成、展开解析）都是一条独立命令：先等目标可见，再执行，最后停一小段时间
//! 让页面的异步更新落地。命令之间不重试，重试只发生在单条命令的元素查找里。

use std::sync::Arc;

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{Config, InteractionConfig};
use crate::error::InteractionError;
use crate::infrastructure::{Document, Locator};
use crate::utils::truncate_text;

/// 页面交互处理器
pub struct PageHandler {
    document: Arc<dyn Document>,
    landing_url: String,
    collapsed_section: String,
    results_toggle: String,
    timing: InteractionConfig,
}

impl PageHandler {
    pub fn new(document: Arc<dyn Document>, config: &Config) -> Self {
        Self {
            document,
            landing_url: config.landing_url(),
            collapsed_section: config.selectors.collapsed_section.clone(),
            results_toggle: config.selectors.results_toggle.clone(),
            timing: config.interaction.clone(),
        }
    }

    /// 等待 body 可见，再停一个稳定间隔
    pub async fn wait_for_page_ready(&self) -> Result<(), InteractionError> {
        let body = Locator::css("body");
        self.wait_visible(&body, "页面 body").await?;
        sleep(self.timing.settle()).await;
        Ok(())
    }

    /// 打开章节列表页
    pub async fn goto_landing(&self) -> Result<(), InteractionError> {
        let url = self.landing_url.clone();
        self.navigate(&url).await
    }

    /// 打开某个章节的测试页
    pub async fn goto_chapter(&self, url: &str) -> Result<(), InteractionError> {
        self.navigate(url).await
    }

    async fn navigate(&self, url: &str) -> Result<(), InteractionError> {
        info!("🌐 正在打开: {}", url);
        self.document.goto(url).await?;
        self.wait_for_page_ready()
            .await
            .map_err(|e| InteractionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        debug!("页面已就绪: {}", url);
        Ok(())
    }

    /// 展开列表页上所有折叠的分组，露出章节链接
    pub async fn expand_sections(&self) -> Result<usize, InteractionError> {
        let clicked = self.document.click_all(&self.collapsed_section).await?;
        if clicked == 0 {
            warn!("⚠️ 没有找到折叠的分组: {}", self.collapsed_section);
        } else {
            info!("✓ 已展开 {} 个分组", clicked);
            sleep(self.timing.settle()).await;
        }
        Ok(clicked)
    }

    /// 点击"Start"开始测试
    pub async fn start_test(&self) -> Result<(), InteractionError> {
        let start = Locator::css_with_text("a", "Start");
        self.click_if_visible(&start, "Start 按钮").await?;
        debug!("已点击 Start");
        sleep(self.timing.settle()).await;
        Ok(())
    }

    /// 按可见文本精确点击一个选项
    pub async fn click_answer(&self, answer_text: &str) -> Result<(), InteractionError> {
        let short = truncate_text(answer_text, 30);
        let answer = Locator::exact_text(answer_text);
        self.click_if_visible(&answer, &format!("选项 '{}'", short))
            .await?;
        debug!("已选择: {}", short);
        sleep(self.timing.settle()).await;
        Ok(())
    }

    /// 点击"Next question"
    pub async fn next_question(&self) -> Result<(), InteractionError> {
        let next = Locator::css_with_text("a", "Next question");
        self.click_if_visible(&next, "Next question 按钮").await?;
        sleep(self.timing.settle()).await;
        Ok(())
    }

    /// 点击"Finish"完成测试，之后结果页需要更长的稳定时间
    pub async fn finish_test(&self) -> Result<(), InteractionError> {
        let finish = Locator::css_with_text("span", "Finish");
        self.click_if_visible(&finish, "Finish 按钮").await?;
        info!("🏁 已完成测试");
        sleep(self.timing.finish_settle()).await;
        Ok(())
    }

    /// 展开结果页的解析面板
    pub async fn open_results_panel(&self) -> Result<(), InteractionError> {
        let toggle = Locator::css(self.results_toggle.clone());
        self.click_if_visible(&toggle, "解析展开按钮").await?;
        debug!("解析面板已展开");
        sleep(self.timing.settle()).await;
        Ok(())
    }

    /// 在超时内轮询，直到元素可见
    async fn wait_visible(&self, locator: &Locator, name: &str) -> Result<(), InteractionError> {
        let timeout = self.timing.element_timeout();
        let deadline = Instant::now() + timeout;
        loop {
            if self.document.is_visible(locator).await? {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(InteractionError::Timeout {
                    element: name.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            sleep(self.timing.poll_interval().min(deadline - now)).await;
        }
    }

    /// 等元素可见后点击，超时则按 `click_retries` 重试
    async fn click_if_visible(&self, locator: &Locator, name: &str) -> Result<(), InteractionError> {
        let attempts = self.timing.click_retries + 1;
        for attempt in 1..=attempts {
            debug!("等待 '{}' 可见 (尝试 {}/{})", name, attempt, attempts);
            match self.wait_visible(locator, name).await {
                Ok(()) => {
                    return self
                        .document
                        .click(locator)
                        .await
                        .map_err(|e| match e {
                            InteractionError::ElementNotFound { .. } => {
                                InteractionError::ElementNotFound {
                                    element: name.to_string(),
                                    attempts: attempt,
                                }
                            }
                            other => other,
                        });
                }
                Err(InteractionError::Timeout { timeout_ms, .. }) => {
                    warn!(
                        "'{}' 在 {}ms 内不可见 (尝试 {}/{})",
                        name, timeout_ms, attempt, attempts
                    );
                    if attempt < attempts {
                        sleep(self.timing.settle()).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        error!("❌ 元素 '{}' 在 {} 次尝试后仍不可见", name, attempts);
        Err(InteractionError::ElementNotFound {
            element: name.to_string(),
            attempts,
        })
    }
}
