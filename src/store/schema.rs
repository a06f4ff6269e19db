use rusqlite::Connection;

use crate::error::StoreError;

/// 建表（可重复执行）
///
/// 题目和选项带 `position` 列，读取时按站点上的顺序还原。
pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS chapters (
            id         INTEGER PRIMARY KEY,
            title      TEXT NOT NULL,
            intro      TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS questions (
            id           INTEGER PRIMARY KEY,
            chapter_id   INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
            position     INTEGER NOT NULL,
            question     TEXT NOT NULL,
            image_url    TEXT,
            image_base64 TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_questions_chapter ON questions(chapter_id, position);

        CREATE TABLE IF NOT EXISTS answers (
            id                INTEGER PRIMARY KEY,
            question_id       INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            position          INTEGER NOT NULL,
            answer            TEXT NOT NULL,
            is_correct_answer BOOLEAN NOT NULL DEFAULT 0,
            explanation       TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id, position);
        ",
    )
    .map_err(StoreError::Schema)
}
