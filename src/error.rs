use std::path::PathBuf;
use thiserror::Error;

use crate::workflow::ChapterState;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器会话错误（启动 / 创建页面 / 关闭）
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 页面交互错误
    #[error("页面交互错误: {0}")]
    Interaction(#[from] InteractionError),
    /// 数据提取错误
    #[error("数据提取错误: {0}")]
    Extraction(#[from] ExtractionError),
    /// 图片下载错误
    #[error("下载错误: {0}")]
    Fetch(#[from] FetchError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 模拟答题错误
    #[error("模拟答题错误: {0}")]
    Simulation(#[from] SimulationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 单个章节处理失败（带上出错的 URL 和已到达的状态）
    #[error("章节处理失败 ({url}, 状态: {state:?}): {source}")]
    Orchestration {
        url: String,
        state: ChapterState,
        #[source]
        source: Box<AppError>,
    },
    /// 任务被取消
    #[error("任务已取消")]
    Cancelled,
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 关闭浏览器失败
    #[error("关闭浏览器失败: {source}")]
    CloseFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 页面交互错误
#[derive(Debug, Error)]
pub enum InteractionError {
    /// 导航失败
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },
    /// 重试后仍找不到可见元素
    #[error("元素 '{element}' 在 {attempts} 次尝试后仍不可见")]
    ElementNotFound { element: String, attempts: usize },
    /// 等待超时
    #[error("等待 '{element}' 超时 ({timeout_ms}ms)")]
    Timeout { element: String, timeout_ms: u64 },
    /// 其他交互失败（脚本执行、点击等）
    #[error("{operation} 失败: {reason}")]
    Failed { operation: String, reason: String },
}

/// 数据提取错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 页面中没有内嵌的章节 JSON
    #[error("页面源码中未找到 window._rrltModuleContent")]
    MissingChapterJson,
    /// 章节 JSON 解析失败
    #[error("章节 JSON 解析失败: {source}")]
    InvalidChapterJson {
        #[source]
        source: serde_json::Error,
    },
    /// 结果页没有任何解析卡片
    #[error("结果页未找到解析卡片 ({selector})")]
    MissingResultCards { selector: String },
    /// 文档查询失败
    #[error("文档查询失败: {0}")]
    Query(#[from] InteractionError),
}

/// 图片下载失败
#[derive(Debug, Error)]
#[error("下载 {url} 失败 (尝试 {attempts} 次): {cause}")]
pub struct FetchError {
    pub url: String,
    pub attempts: usize,
    #[source]
    pub cause: TransportError,
}

/// 单次网络请求失败
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("请求超时")]
    Timeout,
    #[error("网络错误: {0}")]
    Network(String),
    #[error("HTTP 状态码 {0}")]
    Status(u16),
    #[error("无效的 URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout | TransportError::Network(_) | TransportError::Status(_)
        )
    }
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("无法打开数据库 {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("初始化表结构失败: {0}")]
    Schema(#[source] rusqlite::Error),
    #[error("{operation} 查询失败: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    /// 写入章节的事务失败（已回滚）
    #[error("章节 {chapter_id} 写入失败，事务已回滚: {source}")]
    Transaction {
        chapter_id: i64,
        #[source]
        source: rusqlite::Error,
    },
    #[error("无法创建目录 {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 模拟答题错误
#[derive(Debug, Error)]
pub enum SimulationError {
    /// 题目没有任何选项，无法继续答题
    #[error("题目 {question_id} 没有任何选项")]
    NoAnswers { question_id: i64 },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {} 失败: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {} 失败: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("无效的地址 '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 给章节级错误附加 URL 和状态
    pub fn in_chapter(self, url: impl Into<String>, state: ChapterState) -> Self {
        AppError::Orchestration {
            url: url.into(),
            state,
            source: Box::new(self),
        }
    }
}

impl InteractionError {
    /// 创建通用交互失败错误
    pub fn failed(operation: impl Into<String>, reason: impl ToString) -> Self {
        InteractionError::Failed {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_classify_retryable() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(TransportError::Status(503).is_retryable());
        assert!(!TransportError::InvalidUrl("::".into()).is_retryable());
    }

    #[test]
    fn orchestration_wraps_source_with_url() {
        let err = AppError::from(ExtractionError::MissingChapterJson)
            .in_chapter("https://example.test/c1", ChapterState::NavigatedToChapter);

        match &err {
            AppError::Orchestration { url, state, source } => {
                assert_eq!(url, "https://example.test/c1");
                assert_eq!(*state, ChapterState::NavigatedToChapter);
                assert!(matches!(
                    **source,
                    AppError::Extraction(ExtractionError::MissingChapterJson)
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("https://example.test/c1"));
    }

    #[test]
    fn simulation_error_names_question() {
        let err = AppError::from(SimulationError::NoAnswers { question_id: 30 });
        assert!(err.to_string().contains("30"));
    }
}
