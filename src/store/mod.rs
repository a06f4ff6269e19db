//! 持久化层
//!
//! 章节是最小写入单位：要么章节、题目、选项全部写入，要么一条都没有。

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteChapterStore;

use crate::error::StoreError;
use crate::models::{Chapter, ChapterSummary};

/// 章节存储
pub trait ChapterStore: Send {
    /// 章节是否已入库
    fn exists(&self, chapter_id: i64) -> Result<bool, StoreError>;

    /// 写入整章，已存在时返回 `false` 且不做任何修改
    fn insert(&self, chapter: &Chapter) -> Result<bool, StoreError>;

    fn get_chapter(&self, chapter_id: i64) -> Result<Option<Chapter>, StoreError>;

    fn list_chapters(&self) -> Result<Vec<ChapterSummary>, StoreError>;

    /// 删除章节及其题目、选项，返回是否删除了记录
    fn delete_chapter(&self, chapter_id: i64) -> Result<bool, StoreError>;
}
