//! 业务能力层
//!
//! 每个服务只描述"我能做什么"，不关心一章的处理顺序

pub mod extractor;
pub mod image_fetcher;
pub mod merger;
pub mod page_handler;

pub use extractor::Extractor;
pub use image_fetcher::{HttpTransport, ImageFetcher, Transport};
pub use merger::merge_explanations;
pub use page_handler::PageHandler;
