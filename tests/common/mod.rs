//! 集成测试用的脚本化站点

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use road_code_scraper::config::{Config, InteractionConfig, NetworkConfig};
use road_code_scraper::error::{InteractionError, TransportError};
use road_code_scraper::services::{ImageFetcher, Transport};
use road_code_scraper::{Document, Locator};

pub const BASE_URL: &str = "https://site.test";

/// 假站点：记录所有导航和点击
#[derive(Default)]
pub struct FakeSite {
    /// 列表页的链接分组
    pub groups: Vec<Vec<Option<String>>>,
    /// URL → 页面源码
    pub pages: HashMap<String, String>,
    /// URL → 结果页卡片（题号、主解析、补充解析）
    pub cards: HashMap<String, Vec<Vec<Option<String>>>>,
    /// 每次点击后额外停顿，用来让取消落在章节中途
    pub click_delay: Option<Duration>,
    current: Mutex<String>,
    actions: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(mut self, groups: Vec<Vec<&str>>) -> Self {
        self.groups = groups
            .into_iter()
            .map(|g| g.into_iter().map(|href| Some(href.to_string())).collect())
            .collect();
        self
    }

    pub fn with_chapter(mut self, url: &str, json: &str, cards: Vec<Vec<Option<&str>>>) -> Self {
        self.pages.insert(url.to_string(), chapter_page(json));
        self.cards.insert(
            url.to_string(),
            cards
                .into_iter()
                .map(|card| card.into_iter().map(|p| p.map(str::to_string)).collect())
                .collect(),
        );
        self
    }

    pub fn with_click_delay(mut self, delay: Duration) -> Self {
        self.click_delay = Some(delay);
        self
    }

    pub fn with_raw_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| a.strip_prefix("click ").map(str::to_string))
            .collect()
    }

    pub fn visited(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| a.strip_prefix("goto ").map(str::to_string))
            .collect()
    }

    pub fn clear_actions(&self) {
        self.actions.lock().unwrap().clear();
    }

    fn record(&self, action: String) {
        self.actions.lock().unwrap().push(action);
    }

    fn current(&self) -> String {
        self.current.lock().unwrap().clone()
    }
}

/// 把章节 JSON 包进和线上一样的页面
pub fn chapter_page(json: &str) -> String {
    format!(
        "<html><head><script>window.dataLayer = [];\nwindow._rrltModuleContent = {json};\n</script></head><body><a>Start</a></body></html>"
    )
}

#[async_trait]
impl Document for FakeSite {
    async fn goto(&self, url: &str) -> Result<(), InteractionError> {
        self.record(format!("goto {url}"));
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn source(&self) -> Result<String, InteractionError> {
        Ok(self.pages.get(&self.current()).cloned().unwrap_or_default())
    }

    async fn is_visible(&self, _locator: &Locator) -> Result<bool, InteractionError> {
        Ok(true)
    }

    async fn click(&self, locator: &Locator) -> Result<(), InteractionError> {
        self.record(format!("click {locator}"));
        if let Some(delay) = self.click_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn click_all(&self, css: &str) -> Result<usize, InteractionError> {
        self.record(format!("click_all {css}"));
        Ok(self.groups.len())
    }

    async fn links_in_groups(
        &self,
        _group: &str,
        _entry: &str,
    ) -> Result<Vec<Vec<Option<String>>>, InteractionError> {
        Ok(self.groups.clone())
    }

    async fn texts_in_cards(
        &self,
        _card: &str,
        _parts: &[String],
    ) -> Result<Vec<Vec<Option<String>>>, InteractionError> {
        Ok(self.cards.get(&self.current()).cloned().unwrap_or_default())
    }
}

/// 所有图片都返回同样内容的传输层
pub struct StaticImages {
    pub body: Vec<u8>,
    requests: Mutex<Vec<String>>,
}

impl StaticImages {
    pub fn new(body: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            body: body.to_vec(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StaticImages {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(self.body.clone())
    }
}

/// 每次请求都返回同一个错误的传输层
pub struct BrokenImages {
    pub error: TransportError,
    attempts: Mutex<usize>,
}

impl BrokenImages {
    pub fn new(error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            error,
            attempts: Mutex::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Transport for BrokenImages {
    async fn get(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
        *self.attempts.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}

/// 不等待的测试配置
pub fn fast_config() -> Config {
    Config {
        base_url: BASE_URL.to_string(),
        interaction: InteractionConfig {
            element_timeout_ms: 20,
            settle_ms: 0,
            finish_settle_ms: 0,
            click_retries: 0,
            poll_interval_ms: 1,
        },
        network: NetworkConfig {
            retry_delay_ms: 0,
            ..NetworkConfig::default()
        },
        ..Config::default()
    }
}

pub fn fetcher(transport: Arc<dyn Transport>, config: &Config) -> ImageFetcher {
    ImageFetcher::new(transport, &config.network)
}
