//! 解析合并
//!
//! 结果页的解析按位置和题目对齐：第 i 张卡片对应第 i 道题。

use tracing::{debug, warn};

use crate::models::Chapter;

/// 把解析写到每道题的正确答案上，返回新的章节，不修改输入
pub fn merge_explanations(chapter: &Chapter, explanations: &[String]) -> Chapter {
    let mut merged = chapter.clone();

    if merged.questions.len() != explanations.len() {
        warn!(
            "⚠️ 章节 '{}' 题目数 ({}) 与解析数 ({}) 不一致，只合并前 {} 条",
            merged.title,
            merged.questions.len(),
            explanations.len(),
            merged.questions.len().min(explanations.len())
        );
    }

    for (index, (question, explanation)) in merged
        .questions
        .iter_mut()
        .zip(explanations.iter())
        .enumerate()
    {
        let question_id = question.id;
        match question.correct_answer_mut() {
            Some(answer) => {
                answer.explanation = Some(explanation.clone());
                debug!("第 {} 题 (ID: {}) 已写入解析", index + 1, question_id);
            }
            None => {
                warn!(
                    "⚠️ 第 {} 题 (ID: {}) 没有正确答案，跳过解析",
                    index + 1,
                    question_id
                );
            }
        }
    }

    merged
}
