// src/handlers/mod.rs

pub mod analytics;
pub mod auth;
pub mod courses;
pub mod questions;
pub mod submissions;

use crate::{error::AppError, models::course::Course, store::AssessmentStore, utils::jwt::Claims};

/// Loads a course and verifies the caller owns it.
/// Shared by the authoring and analytics handlers.
pub(crate) async fn require_course_owner(
    store: &dyn AssessmentStore,
    course_id: i64,
    claims: &Claims,
) -> Result<Course, AppError> {
    let course = store
        .get_course(course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if course.teacher_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "Only the course owner may do this".to_string(),
        ));
    }

    Ok(course)
}
