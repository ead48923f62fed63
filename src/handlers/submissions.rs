// src/handlers/submissions.rs

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        course::EnrollmentStatus,
        submission::{SubmitRequest, SubmitResponse},
    },
    scoring::grade,
    state::AppState,
    utils::jwt::Claims,
};

use super::require_course_owner;

/// Submits a student's answers against one assessment and persists the
/// graded attempt.
///
/// * Requires an active enrollment in the course owning the assessment.
/// * Rejects empty answer payloads before grading.
/// * Grading never fails on wrong answers; the whole attempt is stored in
///   one atomic write. Re-submitting creates an independent record.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state
        .store
        .get_assessment(assessment_id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    let enrollment = state
        .store
        .enrollment_for(assessment.course_id, claims.user_id())
        .await?;
    match enrollment {
        Some(e) if e.status == EnrollmentStatus::Active => {}
        _ => {
            return Err(AppError::Forbidden(
                "You are not actively enrolled in this course".to_string(),
            ));
        }
    }

    if payload.answers.is_empty() {
        return Err(AppError::Validation("Answers are required".to_string()));
    }

    let bank = state.store.load_question_bank(assessment_id).await?;
    if bank.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for this test".to_string(),
        ));
    }

    let outcome = grade(&bank, &payload.answers);

    let (submission, records) = state
        .store
        .insert_submission(claims.user_id(), assessment_id, &outcome)
        .await?;

    tracing::info!(
        submission_id = submission.id,
        student_id = submission.student_id,
        role = claims.role.as_str(),
        assessment_id,
        score = submission.score,
        total_points = submission.total_points,
        "submission graded"
    );

    let results: BTreeMap<i64, bool> = records
        .iter()
        .map(|r| (r.question_id, r.is_correct))
        .collect();

    Ok(Json(SubmitResponse {
        submission_id: submission.id,
        score: submission.score,
        total_points: submission.total_points,
        results,
    }))
}

/// Fetches one graded attempt with its answer records.
/// Visible to the submitting student and the course owner.
pub async fn get_submission(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (submission, records) = state
        .store
        .get_submission(id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    if submission.student_id != claims.user_id() {
        let assessment = state
            .store
            .get_assessment(submission.assessment_id)
            .await?
            .ok_or(AppError::NotFound("Assessment not found".to_string()))?;
        require_course_owner(state.store.as_ref(), assessment.course_id, &claims).await?;
    }

    Ok(Json(json!({
        "submission": submission,
        "answers": records,
    })))
}
