// src/scoring.rs

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{
        question::{Question, QuestionKind},
        submission::SubmittedAnswer,
    },
};

/// The graded outcome for one question, before it gains a submission id and
/// becomes a persisted `AnswerRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub answer: String,
    pub is_correct: bool,
    pub points_earned: i32,
}

/// Result of grading one answer set against one question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeOutcome {
    pub answers: Vec<GradedAnswer>,
    pub score: i32,
    pub total_points: i32,
}

/// Compares one submitted answer against the canonical one.
/// Trimmed, case-insensitive equality is the only correctness rule; it holds
/// uniformly for every question kind.
fn answers_match(submitted: &str, correct: &str) -> bool {
    submitted.trim().to_lowercase() == correct.trim().to_lowercase()
}

/// Grades a set of submitted answers against a question bank.
///
/// * Iterates questions in the bank's stored order.
/// * A question with no matching submitted answer is graded as an empty
///   string: incorrect, zero points, still counted toward `total_points`.
/// * Wrong answers are normal results, never errors; given a bank this
///   function cannot fail.
pub fn grade(questions: &[Question], submitted: &[SubmittedAnswer]) -> GradeOutcome {
    let by_question: HashMap<i64, &str> = submitted
        .iter()
        .map(|a| (a.question_id, a.answer.as_str()))
        .collect();

    let mut answers = Vec::with_capacity(questions.len());
    let mut score = 0;
    let mut total_points = 0;

    for question in questions {
        total_points += question.points;

        let answer = by_question
            .get(&question.id)
            .copied()
            .unwrap_or("")
            .to_string();

        let is_correct = answers_match(&answer, &question.correct_answer);
        let points_earned = if is_correct { question.points } else { 0 };
        score += points_earned;

        answers.push(GradedAnswer {
            question_id: question.id,
            answer,
            is_correct,
            points_earned,
        });
    }

    GradeOutcome {
        answers,
        score,
        total_points,
    }
}

/// Validates question content at creation/update time.
///
/// A `multiple_choice` question must carry at least two non-empty options
/// after trimming, and its trimmed `correct_answer` must equal one of the
/// trimmed options. Points must be positive. Grading itself never
/// re-validates; a bank read is trusted as-is.
pub fn validate_question_content(
    kind: QuestionKind,
    options: &[String],
    correct_answer: &str,
    points: i32,
) -> Result<(), AppError> {
    if points <= 0 {
        return Err(AppError::Validation(
            "Question points must be positive".to_string(),
        ));
    }

    if kind == QuestionKind::MultipleChoice {
        let trimmed: Vec<&str> = options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect();

        if trimmed.len() < 2 {
            return Err(AppError::Validation(
                "Multiple choice questions need at least 2 non-empty options".to_string(),
            ));
        }

        let answer = correct_answer.trim();
        if !trimmed.iter().any(|o| *o == answer) {
            return Err(AppError::Validation(
                "Correct answer must be one of the options".to_string(),
            ));
        }
    } else if correct_answer.trim().is_empty() {
        return Err(AppError::Validation(
            "Correct answer must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Whether a question kind is allowed on an assessment of the given kind.
/// MCQ tests only support multiple choice; listening tests accept all kinds.
pub fn kind_allowed(
    assessment: crate::models::course::AssessmentKind,
    question: QuestionKind,
) -> bool {
    match assessment {
        crate::models::course::AssessmentKind::Mcq => question == QuestionKind::MultipleChoice,
        crate::models::course::AssessmentKind::Listening => true,
    }
}
