// src/handlers/analytics.rs

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::course::EnrollmentStatus,
    ranking::{course_analytics, rank_students, scope_records},
    state::AppState,
    utils::jwt::Claims,
};

use super::require_course_owner;

/// Query parameters for the ranking endpoint.
#[derive(Debug, Deserialize)]
pub struct RankingParams {
    /// Narrows the scope from the whole course to one group.
    pub group_id: Option<i64>,
}

/// Computes the per-student ranking for a course, optionally narrowed to a
/// group. Visible to the course owner and actively enrolled students.
///
/// Rankings are always recomputed on demand; nothing is cached at write
/// time. Students without submissions in scope are absent from the result.
pub async fn ranking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, AppError> {
    let course = state
        .store
        .get_course(course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if course.teacher_id != claims.user_id() {
        let enrollment = state
            .store
            .enrollment_for(course_id, claims.user_id())
            .await?;
        match enrollment {
            Some(e) if e.status == EnrollmentStatus::Active => {}
            _ => {
                return Err(AppError::Forbidden(
                    "You are not actively enrolled in this course".to_string(),
                ));
            }
        }
    }

    if let Some(group_id) = params.group_id {
        let group = state
            .store
            .get_group(group_id)
            .await?
            .ok_or(AppError::NotFound("Group not found".to_string()))?;
        if group.course_id != course_id {
            return Err(AppError::Validation(
                "Group does not belong to this course".to_string(),
            ));
        }
    }

    let enrollments = state
        .store
        .list_enrollments(course_id, params.group_id)
        .await?;
    let students: HashSet<i64> = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Active)
        .map(|e| e.student_id)
        .collect();

    let records = state.store.list_course_submissions(course_id).await?;
    let scoped = scope_records(&records, &students);

    Ok(Json(rank_students(&scoped)))
}

/// Course-level dashboard aggregates. Owner only.
pub async fn course_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_course_owner(state.store.as_ref(), course_id, &claims).await?;

    let enrollments = state.store.list_enrollments(course_id, None).await?;
    let assessment_count = state.store.count_assessments(course_id).await?;
    let records = state.store.list_course_submissions(course_id).await?;
    let events = state.store.list_material_events(course_id).await?;

    Ok(Json(course_analytics(
        &enrollments,
        assessment_count,
        &records,
        &events,
    )))
}
