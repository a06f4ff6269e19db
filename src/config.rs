use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 站点根地址，相对链接和图片都基于它解析
    pub base_url: String,
    /// 章节列表页路径
    pub landing_path: String,
    /// SQLite 数据库文件
    pub db_path: PathBuf,
    /// 日志目录
    pub log_dir: PathBuf,
    pub browser: BrowserSettings,
    pub interaction: InteractionConfig,
    pub network: NetworkConfig,
    pub selectors: Selectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://drive.govt.nz".to_string(),
            landing_path: "/learner-licence/interactive-road-code".to_string(),
            db_path: PathBuf::from("assets/road_code_test.db"),
            log_dir: PathBuf::from("assets/logs"),
            browser: BrowserSettings::default(),
            interaction: InteractionConfig::default(),
            network: NetworkConfig::default(),
            selectors: Selectors::default(),
        }
    }
}

/// 浏览器启动参数
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: Option<String>,
    /// CDP 请求超时（毫秒）
    pub request_timeout_ms: u64,
    /// 自定义浏览器可执行文件，不填则由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            user_agent: None,
            request_timeout_ms: 30_000,
            chrome_executable: None,
        }
    }
}

/// 页面交互的等待 / 重试参数
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// 等待元素可见的超时
    pub element_timeout_ms: u64,
    /// 每个动作之后的稳定等待
    pub settle_ms: u64,
    /// 点击"完成"之后的稳定等待
    pub finish_settle_ms: u64,
    /// 查找可点击元素的额外重试次数
    pub click_retries: usize,
    /// 轮询可见性的间隔
    pub poll_interval_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: 5_000,
            settle_ms: 1_000,
            finish_settle_ms: 2_000,
            click_retries: 1,
            poll_interval_ms: 100,
        }
    }
}

impl InteractionConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn finish_settle(&self) -> Duration {
        Duration::from_millis(self.finish_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// 图片下载的网络参数
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_ms: u64,
    /// 首次请求之后的最大重试次数
    pub max_retries: usize,
    /// 两次重试之间的固定间隔
    pub retry_delay_ms: u64,
    pub verify_tls: bool,
    /// 同时下载的图片数量
    pub image_concurrency: usize,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            verify_tls: true,
            image_concurrency: 4,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/100.0.4896.127 Safari/537.36"
                .to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// 站点 CSS 选择器，集中放在这里方便站点改版时调整
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// 列表页上折叠的分组
    pub collapsed_section: String,
    /// 章节链接分组
    pub link_group: String,
    /// 分组中的条目，最后一个是测试链接
    pub link_entry: String,
    /// 结果页的展开按钮
    pub results_toggle: String,
    /// 结果页每道题的解析卡片
    pub result_card: String,
    /// 卡片上的题号
    pub card_question_number: String,
    /// 主解析
    pub explanation_main: String,
    /// 补充解析
    pub explanation_additional: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            collapsed_section: "div.accordion.layout--container.layout--nopadding.accordion--inactive"
                .to_string(),
            link_group: "div.card__list".to_string(),
            link_entry: "div.card".to_string(),
            results_toggle: "span.accordion__toggle".to_string(),
            result_card: r#"div[class="carousel__card"]"#.to_string(),
            card_question_number: r#"p[class="carousel__questionNumber"]"#.to_string(),
            explanation_main: r#"div[class="carousel__content carousel__content--tint"] > p"#
                .to_string(),
            explanation_additional:
                r#"div[class="carousel__content carousel__content--tint"] > span > p"#.to_string(),
        }
    }
}

impl Config {
    /// 章节列表页完整地址
    pub fn landing_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.landing_path)
    }

    /// 加载配置：可选的 TOML 文件 + 环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = std::env::var("ROAD_CODE_BASE_URL") {
            self.base_url = v;
        }
        if let Ok(v) = std::env::var("ROAD_CODE_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ROAD_CODE_LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }
        if let Some(v) = parse_env("ROAD_CODE_HEADLESS", "bool")? {
            self.browser.headless = v;
        }
        if let Some(v) = parse_env("ROAD_CODE_MAX_RETRIES", "usize")? {
            self.network.max_retries = v;
        }
        if let Some(v) = parse_env("ROAD_CODE_IMAGE_CONCURRENCY", "usize")? {
            self.network.image_concurrency = v;
        }
        Ok(self)
    }
}

fn parse_env<T: FromStr>(var_name: &str, expected_type: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type,
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_and_timing() {
        let config = Config::default();
        assert_eq!(
            config.landing_url(),
            "https://drive.govt.nz/learner-licence/interactive-road-code"
        );
        assert_eq!(config.interaction.element_timeout(), Duration::from_secs(5));
        assert_eq!(config.interaction.settle(), Duration::from_secs(1));
        assert_eq!(config.interaction.finish_settle(), Duration::from_secs(2));
        assert_eq!(config.interaction.click_retries, 1);
        assert_eq!(config.network.max_retries, 3);
        assert!(config.browser.headless);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/tmp/other.db"

            [network]
            max_retries = 5

            [interaction]
            settle_ms = 10
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.network.max_retries, 5);
        assert_eq!(config.network.retry_delay_ms, 1_000);
        assert_eq!(config.interaction.settle_ms, 10);
        assert_eq!(config.interaction.finish_settle_ms, 2_000);
        assert_eq!(config.base_url, "https://drive.govt.nz");
    }

    #[test]
    fn missing_config_file_is_read_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn poll_interval_never_zero() {
        let interaction = InteractionConfig {
            poll_interval_ms: 0,
            ..InteractionConfig::default()
        };
        assert_eq!(interaction.poll_interval(), Duration::from_millis(1));
    }
}
