//! 章节页内嵌 JSON（`window._rrltModuleContent`）的原始结构

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct RawChapter {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Title", default, deserialize_with = "string_or_null")]
    pub title: String,
    #[serde(rename = "Intro", default, deserialize_with = "string_or_null")]
    pub intro: String,
    #[serde(rename = "Questions", default)]
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestion {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Question", default, deserialize_with = "string_or_null")]
    pub question: String,
    #[serde(rename = "Image", default)]
    pub image: Option<String>,
    #[serde(rename = "Answers", default)]
    pub answers: Vec<RawAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAnswer {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Answer", default, deserialize_with = "string_or_null")]
    pub answer: String,
    /// 出现 `CorrectAnswer` 且值不为 null 就是正确答案，`false` 也算
    #[serde(rename = "CorrectAnswer", default, deserialize_with = "key_present")]
    pub correct: bool,
}

impl RawQuestion {
    /// 非空的图片相对路径
    pub fn image_path(&self) -> Option<&str> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

// 字段缺失时走 default；null 视为缺失
fn key_present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<serde::de::IgnoredAny>::deserialize(deserializer)?.is_some())
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
