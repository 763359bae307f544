//! Domain Services
//!
//! Pure scoring rules shared by both quiz paths.

use crate::domain::entities::Question;
use crate::domain::value_objects::{AnswerSheet, QuizScore};

/// Count the questions answered correctly in an evidence answer sheet.
///
/// Questions missing from the sheet count as wrong; extra keys are ignored.
pub fn grade_answer_sheet(questions: &[Question], sheet: &AnswerSheet) -> QuizScore {
    let correct = questions
        .iter()
        .filter(|q| sheet.answer_for(q.id).is_some_and(|a| q.is_correct(a)))
        .count();
    QuizScore {
        correct,
        total: questions.len(),
    }
}

/// Partial credit: `round(task_points * correct / total)`, halves rounding up.
///
/// Integer arithmetic, so `10 * 1/4 = 2.5` yields 3. Zero questions earn 0.
pub fn partial_credit(task_points: i32, score: QuizScore) -> i32 {
    if score.total == 0 || task_points <= 0 {
        return 0;
    }
    let points = i64::from(task_points);
    let correct = score.correct.min(score.total) as i64;
    let total = score.total as i64;
    let rounded = (2 * points * correct + total) / (2 * total);
    rounded as i32
}
