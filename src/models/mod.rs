pub mod chapter;
pub mod raw;

pub use chapter::{Answer, Chapter, ChapterSummary, Question};
pub use raw::{RawAnswer, RawChapter, RawQuestion};
