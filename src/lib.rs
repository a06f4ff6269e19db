//! # Road Code Scraper
//!
//! 抓取新西兰交通局 (drive.govt.nz) 互动道路规则测验的题目、选项、图片和解析，
//! 并写入 SQLite。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - `BrowserSession`，持有浏览器进程、页面和 CDP 事件任务
//! - `infrastructure/` - `Document` 能力接口，`ChromeDocument` 通过 JS 实现
//! - `store/` - `ChapterStore` 接口与 `SqliteChapterStore`
//!
//! ### ② 业务能力层（Services）
//! - `PageHandler` - 站点交互协议（导航、展开、开始、选择、下一题、完成）
//! - `Extractor` - 章节链接 / 内嵌 JSON / 结果页解析的提取
//! - `ImageFetcher` - 带重试的图片下载与 base64 编码
//! - `merge_explanations` - 把解析按位置合并到正确答案
//!
//! ### ③ 流程层（Workflow）
//! - `ChapterFlow` - 单个章节的完整处理流程（状态见 `ChapterState`）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/scraper` - 批量章节处理，响应取消，汇总统计
//! - `orchestrator/app` - 资源所有者，负责启动和关闭浏览器
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::BrowserSession;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeDocument, Document, Locator};
pub use models::{Answer, Chapter, ChapterSummary, Question};
pub use orchestrator::{App, BatchReport, Scraper};
pub use store::{ChapterStore, SqliteChapterStore};
pub use workflow::{ChapterFlow, ChapterOutcome, ChapterState};
