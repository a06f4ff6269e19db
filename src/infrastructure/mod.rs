pub mod chrome_document;
pub mod document;

pub use chrome_document::ChromeDocument;
pub use document::{Document, Locator};
