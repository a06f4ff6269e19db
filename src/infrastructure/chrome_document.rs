//! chromiumoxide 页面上的文档查询实现
//!
//! 持有唯一的 Page 资源，所有 DOM 查询都通过执行 JS 完成

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::document::{Document, Locator};
use crate::error::InteractionError;

/// 页面里的公共脚本：按 Locator 查找元素（优先可见的那个），以及按元素中心点击
const DOM_HELPERS_JS: &str = r#"
const __visible = (el) => {
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    return style.visibility !== 'hidden' && style.display !== 'none'
        && rect.width > 0 && rect.height > 0;
};
const __text = (el) => (el.innerText || el.textContent || '').trim();
const __find = (loc) => {
    let candidates = [];
    if (loc.kind === 'css') {
        candidates = Array.from(document.querySelectorAll(loc.css));
    } else if (loc.kind === 'css_with_text') {
        candidates = Array.from(document.querySelectorAll(loc.css))
            .filter((el) => __text(el).includes(loc.text));
    } else if (loc.kind === 'exact_text') {
        const all = Array.from(document.querySelectorAll('body *'))
            .filter((el) => __text(el) === loc.text);
        candidates = all.filter((el) => !all.some((other) => other !== el && el.contains(other)));
    }
    return candidates.find(__visible) || candidates[0] || null;
};
const __pointerClick = (el) => {
    el.scrollIntoView({ block: 'center' });
    const rect = el.getBoundingClientRect();
    const x = rect.left + rect.width / 2;
    const y = rect.top + rect.height / 2;
    const hit = document.elementFromPoint(x, y);
    const target = hit && (hit === el || el.contains(hit)) ? hit : el;
    const init = { bubbles: true, cancelable: true, view: window, clientX: x, clientY: y };
    target.dispatchEvent(new MouseEvent('mousedown', init));
    target.dispatchEvent(new MouseEvent('mouseup', init));
    target.dispatchEvent(new MouseEvent('click', init));
};
"#;

/// chromiumoxide 页面
pub struct ChromeDocument {
    page: Page,
}

impl ChromeDocument {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, InteractionError> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| InteractionError::failed("执行脚本", e))?;
        result
            .into_value()
            .map_err(|e| InteractionError::failed("解析脚本结果", e))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, InteractionError> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| InteractionError::failed("解析脚本结果", e))
    }
}

fn js_literal<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, InteractionError> {
    serde_json::to_string(value).map_err(|e| InteractionError::failed("序列化脚本参数", e))
}

/// 点中元素中心处的子元素（折叠分组的开关在容器内部）
fn click_script(locator: &Locator) -> Result<String, InteractionError> {
    Ok(format!(
        r#"(() => {{
            {DOM_HELPERS_JS}
            const el = __find({});
            if (!el) return false;
            __pointerClick(el);
            return true;
        }})()"#,
        js_literal(locator)?
    ))
}

fn click_all_script(css: &str) -> Result<String, InteractionError> {
    Ok(format!(
        r#"(() => {{
            {DOM_HELPERS_JS}
            const els = Array.from(document.querySelectorAll({}));
            els.forEach((el) => __pointerClick(el));
            return els.length;
        }})()"#,
        js_literal(css)?
    ))
}

#[async_trait]
impl Document for ChromeDocument {
    async fn goto(&self, url: &str) -> Result<(), InteractionError> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| InteractionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn source(&self) -> Result<String, InteractionError> {
        self.page
            .content()
            .await
            .map_err(|e| InteractionError::failed("读取页面源码", e))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, InteractionError> {
        let script = format!(
            "(() => {{ {DOM_HELPERS_JS} const el = __find({}); return !!el && __visible(el); }})()",
            js_literal(locator)?
        );
        self.eval_as(script).await
    }

    async fn click(&self, locator: &Locator) -> Result<(), InteractionError> {
        let clicked: bool = self.eval_as(click_script(locator)?).await?;
        if clicked {
            Ok(())
        } else {
            Err(InteractionError::ElementNotFound {
                element: locator.to_string(),
                attempts: 1,
            })
        }
    }

    async fn click_all(&self, css: &str) -> Result<usize, InteractionError> {
        self.eval_as(click_all_script(css)?).await
    }

    async fn links_in_groups(
        &self,
        group: &str,
        entry: &str,
    ) -> Result<Vec<Vec<Option<String>>>, InteractionError> {
        let script = format!(
            r#"(() => Array.from(document.querySelectorAll({})).map((g) =>
                Array.from(g.querySelectorAll({})).map((e) => {{
                    const a = e.querySelector('a');
                    return a ? a.getAttribute('href') : null;
                }})
            ))()"#,
            js_literal(group)?,
            js_literal(entry)?
        );
        self.eval_as(script).await
    }

    async fn texts_in_cards(
        &self,
        card: &str,
        parts: &[String],
    ) -> Result<Vec<Vec<Option<String>>>, InteractionError> {
        let script = format!(
            r#"(() => {{
                const parts = {};
                return Array.from(document.querySelectorAll({})).map((c) =>
                    parts.map((sel) => {{
                        const el = c.querySelector(sel);
                        return el ? (el.innerText || el.textContent || '') : null;
                    }})
                );
            }})()"#,
            js_literal(parts)?,
            js_literal(card)?
        );
        self.eval_as(script).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_all_uses_pointer_click_on_each_match() {
        let script = click_all_script("div.accordion--inactive").unwrap();

        assert!(script.contains(r#"document.querySelectorAll("div.accordion--inactive")"#));
        assert!(script.contains("els.forEach((el) => __pointerClick(el))"));
        assert!(script.contains("elementFromPoint"));
        assert!(!script.contains("el.click()"));
    }

    #[test]
    fn click_targets_element_found_by_locator() {
        let script = click_script(&Locator::css_with_text("a", "Start")).unwrap();

        assert!(script.contains(r#"__find({"kind":"css_with_text","css":"a","text":"Start"})"#));
        assert!(script.contains("__pointerClick(el)"));
    }

    #[test]
    fn selector_quotes_are_escaped() {
        let script = click_all_script(r#"div[class="carousel__card"]"#).unwrap();
        assert!(script.contains(r#"querySelectorAll("div[class=\"carousel__card\"]")"#));
    }
}
