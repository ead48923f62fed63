// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Kind of a graded question.
/// MCQ assessments only accept `multiple_choice`; listening assessments may
/// use any kind. Grading applies the same comparison rule regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_kind", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    FillBlank,
    ShortAnswer,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub assessment_id: i64,

    /// The prompt shown to the student.
    pub text: String,

    pub kind: QuestionKind,

    /// Ordered list of options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database; empty unless `kind` is
    /// `multiple_choice`.
    pub options: Json<Vec<String>>,

    /// The canonical correct answer; case preserved at storage, compared
    /// case-insensitively at grading.
    pub correct_answer: String,

    pub points: i32,

    /// Presentation order within the assessment.
    pub order_index: i32,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to students (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub kind: QuestionKind,
    pub text: String,
    pub options: Json<Vec<String>>,
    pub points: i32,
    pub order_index: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            kind: q.kind,
            text: q.text,
            options: q.options,
            points: q.points,
            order_index: q.order_index,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    pub kind: QuestionKind,
    #[validate(custom(function = validate_option_lengths))]
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    /// Defaults to 1 when absent.
    pub points: Option<i32>,
    /// Defaults to the next free slot when absent.
    pub order_index: Option<i32>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub text: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub points: Option<i32>,
    pub order_index: Option<i32>,
}

/// Fully validated and sanitized question content, ready for insertion.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: i32,
    pub order_index: i32,
}

fn validate_option_lengths(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() > 20 {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
