use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::BrowserSettings;
use crate::error::BrowserError;

/// 一次运行期间唯一的浏览器会话
///
/// 持有 Browser、Page 和 CDP 事件处理任务。正常退出时调用 [`close`](Self::close)
/// 按创建的相反顺序释放；被直接 drop 时只能终止事件任务，浏览器子进程由
/// chromiumoxide 自己回收。
pub struct BrowserSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// 启动浏览器并打开一个空白页面
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        info!(
            "🚀 启动浏览器 (headless={}, {}x{})",
            settings.headless, settings.viewport_width, settings.viewport_height
        );

        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .request_timeout(Duration::from_millis(settings.request_timeout_ms))
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ]);
        builder = if settings.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(|e| {
            error!("配置浏览器失败: {}", e);
            BrowserError::ConfigurationFailed(e)
        })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|source| {
            error!("启动浏览器失败: {}", source);
            BrowserError::LaunchFailed { source }
        })?;
        debug!("浏览器启动成功");

        // 在后台处理浏览器事件
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        let mut session = Self {
            browser: Some(browser),
            page: None,
            handler: Some(handler),
        };

        let page = match session.open_page(settings).await {
            Ok(page) => page,
            Err(e) => {
                session.close().await;
                return Err(e);
            }
        };
        session.page = Some(page);
        info!("✅ 浏览器页面已就绪");
        Ok(session)
    }

    async fn open_page(&self, settings: &BrowserSettings) -> Result<Page, BrowserError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| BrowserError::ConfigurationFailed("浏览器已关闭".to_string()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|source| BrowserError::PageCreationFailed { source })?;
        if let Some(user_agent) = &settings.user_agent {
            page.set_user_agent(SetUserAgentOverrideParams::new(user_agent.clone()))
                .await
                .map_err(|source| BrowserError::PageCreationFailed { source })?;
        }
        Ok(page)
    }

    /// 当前页面
    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// 按 Page → Browser → 事件任务的顺序释放资源，只记录错误不返回
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            debug!("关闭页面");
            if let Err(e) = page.close().await {
                warn!("关闭页面失败: {}", e);
            }
        }
        if let Some(mut browser) = self.browser.take() {
            debug!("关闭浏览器");
            if let Err(source) = browser.close().await {
                warn!("{}", BrowserError::CloseFailed { source });
            }
            if let Err(e) = browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        info!("🧹 浏览器资源已释放");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
