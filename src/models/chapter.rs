use serde::{Deserialize, Serialize};

/// 一个章节（一套测试题）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// 站点分配的章节 ID，也是入库去重的主键
    pub id: i64,
    pub title: String,
    pub intro: String,
    /// 顺序与站点上的出题顺序一致
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// 图片下载失败时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub answer: String,
    pub is_correct_answer: bool,
    /// 只有正确答案才会在模拟答题后填上
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// 已入库章节的概要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterSummary {
    pub id: i64,
    pub title: String,
    pub question_count: usize,
}

impl Question {
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_correct_answer)
    }

    pub fn correct_answer_mut(&mut self) -> Option<&mut Answer> {
        self.answers.iter_mut().find(|a| a.is_correct_answer)
    }

    /// 模拟答题时要点击的选项
    ///
    /// 优先选第一个错误选项（这样结果页一定会展示解析）；
    /// 如果全部标记为正确，退回到第一个选项，第二个返回值为 `true`。
    pub fn answer_to_click(&self) -> Option<(&Answer, bool)> {
        match self.answers.iter().find(|a| !a.is_correct_answer) {
            Some(wrong) => Some((wrong, false)),
            None => self.answers.first().map(|a| (a, true)),
        }
    }
}

impl Chapter {
    pub fn answer_count(&self) -> usize {
        self.questions.iter().map(|q| q.answers.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(id: i64, correct: bool) -> Answer {
        Answer {
            id,
            answer: format!("A{id}"),
            is_correct_answer: correct,
            explanation: None,
        }
    }

    fn question(answers: Vec<Answer>) -> Question {
        Question {
            id: 1,
            question: "Q".into(),
            image_url: None,
            image_base64: None,
            answers,
        }
    }

    #[test]
    fn clicks_first_incorrect_answer() {
        let q = question(vec![answer(1, true), answer(2, false), answer(3, false)]);
        let (picked, fallback) = q.answer_to_click().unwrap();
        assert_eq!(picked.id, 2);
        assert!(!fallback);
    }

    #[test]
    fn falls_back_to_first_answer_when_all_correct() {
        let q = question(vec![answer(7, true), answer(8, true)]);
        let (picked, fallback) = q.answer_to_click().unwrap();
        assert_eq!(picked.id, 7);
        assert!(fallback);
    }

    #[test]
    fn no_answers_means_nothing_to_click() {
        assert!(question(vec![]).answer_to_click().is_none());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let json = serde_json::to_value(answer(1, false)).unwrap();
        assert!(json.get("explanation").is_none());
    }
}
