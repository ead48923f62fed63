// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// One raw answer in a submit payload. Ephemeral: consumed by the scorer to
/// produce an `AnswerRecord`, never persisted as-is.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    /// Raw answer text; may be empty if the student skipped the question.
    pub answer: String,
}

/// DTO for submitting one graded attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Represents the 'answer_records' table: the graded outcome for one
/// question within one submission. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    pub answer: String,
    pub is_correct: bool,
    pub points_earned: i32,
}

/// Represents the 'submissions' table: one complete graded attempt.
/// A student may hold several records for the same assessment; each attempt
/// is independent.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub student_id: i64,
    pub assessment_id: i64,
    pub score: i32,
    pub total_points: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// DTO returned to the client after a successful submit.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission_id: i64,
    pub score: i32,
    pub total_points: i32,
    /// Per-question correctness, keyed by question id.
    pub results: BTreeMap<i64, bool>,
}
