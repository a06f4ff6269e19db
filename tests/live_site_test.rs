//! 需要本机 Chrome 和外网，默认忽略：cargo test -- --ignored

use std::sync::Arc;

use road_code_scraper::config::Config;
use road_code_scraper::services::{Extractor, ImageFetcher, PageHandler};
use road_code_scraper::store::SqliteChapterStore;
use road_code_scraper::{BrowserSession, ChromeDocument, Document, Scraper};
use tokio_util::sync::CancellationToken;

#[tokio::test]
#[ignore]
async fn test_browser_launch() {
    let _ = tracing_subscriber::fmt::try_init();

    let config = Config::from_env().expect("读取配置失败");

    let session = BrowserSession::launch(&config.browser).await;

    assert!(session.is_ok(), "应该能够启动浏览器");
    session.unwrap().close().await;
}

#[tokio::test]
#[ignore]
async fn test_discover_chapter_urls() {
    let _ = tracing_subscriber::fmt::try_init();

    let config = Config::from_env().expect("读取配置失败");
    let session = BrowserSession::launch(&config.browser)
        .await
        .expect("启动浏览器失败");
    let page = session.page().expect("页面未创建").clone();
    let document: Arc<dyn Document> = Arc::new(ChromeDocument::new(page));

    let pages = PageHandler::new(document.clone(), &config);
    let fetcher = ImageFetcher::http(&config.network).expect("创建下载器失败");
    let extractor = Extractor::new(document, fetcher, &config).expect("配置无效");

    pages.goto_landing().await.expect("打开列表页失败");
    pages.expand_sections().await.expect("展开分组失败");
    let urls = extractor.discover_chapter_urls().await;

    session.close().await;

    let urls = urls.expect("提取章节链接失败");
    println!("找到 {} 个章节", urls.len());
    assert!(!urls.is_empty(), "列表页应该至少有一个章节");
    assert!(urls.iter().all(|u| u.starts_with(&config.base_url)));
}

#[tokio::test]
#[ignore]
async fn test_scrape_first_chapter() {
    let _ = tracing_subscriber::fmt::try_init();

    let config = Config::from_env().expect("读取配置失败");
    let session = BrowserSession::launch(&config.browser)
        .await
        .expect("启动浏览器失败");
    let page = session.page().expect("页面未创建").clone();
    let document: Arc<dyn Document> = Arc::new(ChromeDocument::new(page));

    let pages = PageHandler::new(document.clone(), &config);
    let fetcher = ImageFetcher::http(&config.network).expect("创建下载器失败");
    let extractor = Extractor::new(document.clone(), fetcher.clone(), &config).expect("配置无效");
    pages.goto_landing().await.expect("打开列表页失败");
    pages.expand_sections().await.expect("展开分组失败");
    let urls = extractor
        .discover_chapter_urls()
        .await
        .expect("提取章节链接失败");

    let store = SqliteChapterStore::open_in_memory().expect("打开数据库失败");
    let scraper = Scraper::new(document, fetcher, Box::new(store), &config).expect("配置无效");
    let report = scraper
        .run(Some(urls.into_iter().take(1).collect()), &CancellationToken::new())
        .await;

    session.close().await;

    let report = report.expect("抓取失败");
    assert_eq!(report.persisted.len(), 1, "失败: {:?}", report.failed);
    let chapter = scraper
        .store()
        .get_chapter(report.persisted[0])
        .expect("读取章节失败")
        .expect("章节应该已入库");
    assert!(!chapter.questions.is_empty());
    assert!(chapter
        .questions
        .iter()
        .any(|q| q.correct_answer().and_then(|a| a.explanation.as_ref()).is_some()));
}
