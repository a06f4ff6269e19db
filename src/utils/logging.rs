/// 日志工具模块
///
/// 初始化 tracing 订阅器，并提供日志格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::BatchReport;

/// 当天的日志文件路径：`log_dir/app_YYYY-MM-DD.log`
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!(
        "app_{}.log",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}

/// 初始化日志：控制台 + 文件
///
/// # 参数
/// - `log_dir`: 日志目录，不存在时创建
/// - `verbose`: 未设置 `RUST_LOG` 时使用 debug 级别
///
/// # 返回
/// 返回日志文件路径
pub fn init(log_dir: &Path, verbose: bool) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_file_path(log_dir);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let log_header = format!(
        "{}\n道路规则题库抓取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    file.write_all(log_header.as_bytes())?;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},chromiumoxide=warn")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    Ok(path)
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 道路规则题库抓取");
    info!("🌐 列表页: {}", config.landing_url());
    info!("🗄️ 数据库: {}", config.db_path.display());
    info!(
        "🖥️ 浏览器模式: {}",
        if config.browser.headless { "无头" } else { "有界面" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录章节开始信息
///
/// # 参数
/// - `index`: 章节序号（从 1 开始）
/// - `total`: 章节总数
/// - `url`: 章节 URL
pub fn log_chapter_start(index: usize, total: usize, url: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📖 开始处理第 {}/{} 个章节", index, total);
    info!("🔗 {}", url);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_report(report: &BatchReport, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 新保存: {}/{}", report.persisted.len(), report.total);
    info!("⏭️ 已存在: {}", report.skipped_existing.len());
    info!("📭 无题目: {}", report.skipped_empty.len());
    info!("❌ 失败: {}", report.failed.len());
    for (url, reason) in &report.failed {
        info!("   - {}: {}", url, truncate_text(reason, 120));
    }
    if report.is_cancelled() {
        info!("🛑 已取消: {}", report.cancelled.len());
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_text("Give way", 20), "Give way");
        assert_eq!(truncate_text("让行标志牌", 2), "让行...");
    }

    #[test]
    fn log_file_is_dated() {
        let path = log_file_path(Path::new("assets/logs"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("app_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "app_2024-01-01.log".len());
    }
}
