//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 打开存储、启动浏览器会话
//! - 无论成功失败都负责关闭浏览器
//!
//! ### `scraper` - 批量章节处理器
//! - 打开列表页、发现章节链接（或使用指定的 URL）
//! - 逐个章节调用 `ChapterFlow`，单章失败不影响后续章节
//! - 响应取消并汇总统计
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 BrowserSession / Store)
//!     ↓
//! scraper (处理 Vec<URL>)
//!     ↓
//! workflow::ChapterFlow (处理单个章节)
//!     ↓
//! services (能力层：page_handler / extractor / merger / image_fetcher)
//!     ↓
//! infrastructure (基础设施：Document)
//! ```

pub mod app;
pub mod scraper;

pub use app::App;
pub use scraper::{BatchReport, Scraper};
