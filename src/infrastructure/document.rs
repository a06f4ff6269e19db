//! 文档查询能力 - 基础设施层
//!
//! 上层只通过 [`Document`] 访问当前页面：导航、读取源码、判断可见、点击、
//! 以及两种批量查询。具体由 [`ChromeDocument`](super::ChromeDocument) 实现，
//! 测试里可以换成脚本化的假页面。

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::error::InteractionError;

/// 元素定位方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// 纯 CSS 选择器
    Css { css: String },
    /// CSS 选择器 + 文本包含过滤
    CssWithText { css: String, text: String },
    /// 可见文本完全相等（去掉首尾空白）
    ExactText { text: String },
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Locator::Css { css: css.into() }
    }

    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    pub fn exact_text(text: impl Into<String>) -> Self {
        Locator::ExactText { text: text.into() }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { css } => write!(f, "{css}"),
            Locator::CssWithText { css, text } => write!(f, "{css}:has-text(\"{text}\")"),
            Locator::ExactText { text } => write!(f, "text=\"{text}\""),
        }
    }
}

/// 单个活动页面的查询 / 操作能力
///
/// 所有方法都是一次性的，等待和重试由 `PageHandler` 负责。
#[async_trait]
pub trait Document: Send + Sync {
    /// 导航到 URL，等页面加载完成后返回
    async fn goto(&self, url: &str) -> Result<(), InteractionError>;

    /// 当前文档的完整 HTML 源码
    async fn source(&self) -> Result<String, InteractionError>;

    /// 定位到的元素当前是否可见
    async fn is_visible(&self, locator: &Locator) -> Result<bool, InteractionError>;

    /// 点击定位到的第一个（优先可见的）元素，找不到时返回 `ElementNotFound`
    async fn click(&self, locator: &Locator) -> Result<(), InteractionError>;

    /// 点击所有匹配的元素，返回点击数量
    async fn click_all(&self, css: &str) -> Result<usize, InteractionError>;

    /// 每个 `group` 里每个 `entry` 第一个链接的 `href`
    async fn links_in_groups(
        &self,
        group: &str,
        entry: &str,
    ) -> Result<Vec<Vec<Option<String>>>, InteractionError>;

    /// 每个 `card` 里依次取 `parts` 中各选择器的文本，找不到为 `None`
    async fn texts_in_cards(
        &self,
        card: &str,
        parts: &[String],
    ) -> Result<Vec<Vec<Option<String>>>, InteractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_serializes_with_kind_tag() {
        let json = serde_json::to_value(Locator::css_with_text("a", "Start")).unwrap();
        assert_eq!(json["kind"], "css_with_text");
        assert_eq!(json["css"], "a");
        assert_eq!(json["text"], "Start");
    }

    #[test]
    fn locator_display_is_readable() {
        assert_eq!(Locator::css("span.x").to_string(), "span.x");
        assert_eq!(Locator::exact_text("Yes").to_string(), "text=\"Yes\"");
    }
}
