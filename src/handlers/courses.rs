// src/handlers/courses.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::course::{
        CreateCourseRequest, CreateGroupRequest, CreateMaterialRequest, EnrollRequest,
        EnrollmentStatus, MaterialEventKind, MaterialEventRequest, MaterialKind,
        UpdateEnrollmentRequest,
    },
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

use super::require_course_owner;

/// Creates a new course owned by the calling teacher.
pub async fn create_course(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let course = state
        .store
        .create_course(
            claims.user_id(),
            &clean_html(&payload.title),
            payload.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(course)))
}

/// Creates a group inside a course. Owner only.
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    require_course_owner(state.store.as_ref(), course_id, &claims).await?;

    let group = state.store.create_group(course_id, &payload.name).await?;

    Ok((StatusCode::CREATED, Json(group)))
}

/// Enrolls the calling student into a course, optionally into a group.
/// Re-enrolling updates the group membership; it never resets a status the
/// owner has set.
pub async fn enroll(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _course = state
        .store
        .get_course(course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if let Some(group_id) = payload.group_id {
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

    let enrollment = state
        .store
        .upsert_enrollment(course_id, claims.user_id(), payload.group_id)
        .await?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Changes one enrollment's status (active/blocked/restricted). Owner only.
pub async fn update_enrollment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, student_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateEnrollmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_course_owner(state.store.as_ref(), course_id, &claims).await?;

    let enrollment = state
        .store
        .set_enrollment_status(course_id, student_id, payload.status)
        .await?
        .ok_or(AppError::NotFound("Enrollment not found".to_string()))?;

    Ok(Json(enrollment))
}

/// Creates a piece of course material. Owner only.
pub async fn create_material(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    require_course_owner(state.store.as_ref(), course_id, &claims).await?;

    let material = state
        .store
        .create_material(
            course_id,
            &clean_html(&payload.title),
            payload.kind,
            payload.file_url.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(material)))
}

/// Records a consumption event (video completed, pdf downloaded) for the
/// calling student against one material. Requires active enrollment in the
/// owning course.
pub async fn record_material_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(material_id): Path<i64>,
    Json(payload): Json<MaterialEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let material = state
        .store
        .get_material(material_id)
        .await?
        .ok_or(AppError::NotFound("Material not found".to_string()))?;

    let enrollment = state
        .store
        .enrollment_for(material.course_id, claims.user_id())
        .await?;
    match enrollment {
        Some(e) if e.status == EnrollmentStatus::Active => {}
        _ => {
            return Err(AppError::Forbidden(
                "You are not actively enrolled in this course".to_string(),
            ));
        }
    }

    let kind_matches = matches!(
        (payload.kind, material.kind),
        (MaterialEventKind::VideoCompleted, MaterialKind::Video)
            | (MaterialEventKind::PdfDownloaded, MaterialKind::Pdf)
    );
    if !kind_matches {
        return Err(AppError::Validation(
            "Event kind does not match the material kind".to_string(),
        ));
    }

    let event = state
        .store
        .record_material_event(material_id, claims.user_id(), payload.kind)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}
