use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{Answer, Chapter, ChapterSummary, Question};
use crate::store::schema::init_schema;
use crate::store::ChapterStore;

/// 基于 SQLite 的章节存储
pub struct SqliteChapterStore {
    conn: Connection,
}

impl SqliteChapterStore {
    /// 打开（必要时创建）数据库文件并建表
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("🗄️ 数据库: {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(StoreError::Schema)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn write_chapter(&self, chapter: &Chapter) -> Result<(), rusqlite::Error> {
        let tx = self.conn.unchecked_transaction()?;
        {
            tx.execute(
                "INSERT INTO chapters (id, title, intro) VALUES (?1, ?2, ?3)",
                params![chapter.id, chapter.title, chapter.intro],
            )?;

            let mut q_stmt = tx.prepare(
                "INSERT INTO questions
                 (id, chapter_id, position, question, image_url, image_base64)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut a_stmt = tx.prepare(
                "INSERT INTO answers
                 (id, question_id, position, answer, is_correct_answer, explanation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for (q_pos, q) in chapter.questions.iter().enumerate() {
                q_stmt.execute(params![
                    q.id,
                    chapter.id,
                    q_pos as i64,
                    q.question,
                    q.image_url,
                    q.image_base64,
                ])?;
                for (a_pos, a) in q.answers.iter().enumerate() {
                    a_stmt.execute(params![
                        a.id,
                        q.id,
                        a_pos as i64,
                        a.answer,
                        a.is_correct_answer,
                        a.explanation,
                    ])?;
                }
            }
        }
        // 未提交的事务在 drop 时回滚
        tx.commit()
    }

    fn load_answers(&self, question_id: i64) -> Result<Vec<Answer>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, answer, is_correct_answer, explanation
             FROM answers WHERE question_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![question_id], |row| {
            Ok(Answer {
                id: row.get(0)?,
                answer: row.get(1)?,
                is_correct_answer: row.get(2)?,
                explanation: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    fn load_questions(&self, chapter_id: i64) -> Result<Vec<Question>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question, image_url, image_base64
             FROM questions WHERE chapter_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![chapter_id], |row| {
            Ok(Question {
                id: row.get(0)?,
                question: row.get(1)?,
                image_url: row.get(2)?,
                image_base64: row.get(3)?,
                answers: Vec::new(),
            })
        })?;

        let mut questions = rows.collect::<Result<Vec<_>, _>>()?;
        for q in &mut questions {
            q.answers = self.load_answers(q.id)?;
        }
        Ok(questions)
    }
}

impl ChapterStore for SqliteChapterStore {
    fn exists(&self, chapter_id: i64) -> Result<bool, StoreError> {
        self.conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM chapters WHERE id = ?1)",
                params![chapter_id],
                |row| row.get(0),
            )
            .map_err(|source| StoreError::Query {
                operation: "exists",
                source,
            })
    }

    fn insert(&self, chapter: &Chapter) -> Result<bool, StoreError> {
        if self.exists(chapter.id)? {
            warn!("⚠️ 章节 {} 已存在，跳过写入", chapter.id);
            return Ok(false);
        }

        self.write_chapter(chapter)
            .map_err(|source| StoreError::Transaction {
                chapter_id: chapter.id,
                source,
            })?;

        debug!(
            "章节 {} 写入完成: {} 道题, {} 个选项",
            chapter.id,
            chapter.questions.len(),
            chapter.answer_count()
        );
        Ok(true)
    }

    fn get_chapter(&self, chapter_id: i64) -> Result<Option<Chapter>, StoreError> {
        let query_err = |source| StoreError::Query {
            operation: "get_chapter",
            source,
        };

        let header = self
            .conn
            .query_row(
                "SELECT title, intro FROM chapters WHERE id = ?1",
                params![chapter_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(query_err)?;

        let Some((title, intro)) = header else {
            return Ok(None);
        };
        let questions = self.load_questions(chapter_id).map_err(query_err)?;

        Ok(Some(Chapter {
            id: chapter_id,
            title,
            intro,
            questions,
        }))
    }

    fn list_chapters(&self) -> Result<Vec<ChapterSummary>, StoreError> {
        let query_err = |source| StoreError::Query {
            operation: "list_chapters",
            source,
        };

        let mut stmt = self
            .conn
            .prepare(
                "SELECT c.id, c.title, COUNT(q.id)
                 FROM chapters c LEFT JOIN questions q ON q.chapter_id = c.id
                 GROUP BY c.id, c.title
                 ORDER BY c.id",
            )
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ChapterSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    question_count: row.get::<_, i64>(2)? as usize,
                })
            })
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn delete_chapter(&self, chapter_id: i64) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM chapters WHERE id = ?1", params![chapter_id])
            .map_err(|source| StoreError::Query {
                operation: "delete_chapter",
                source,
            })?;
        if deleted > 0 {
            info!("🗑️ 已删除章节 {}", chapter_id);
        }
        Ok(deleted > 0)
    }
}
