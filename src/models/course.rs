// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// Represents the 'courses' table. `teacher_id` is the owning teacher.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

/// Represents the 'course_groups' table: a named subset of a course's
/// students, used to narrow ranking and analytics scopes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
}

/// DTO for creating a group inside a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Status of one student's membership in one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Blocked,
    Restricted,
}

/// Represents the 'enrollments' table.
/// One row per (course, student); re-enrolling updates the group instead of
/// inserting a duplicate.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub group_id: Option<i64>,
    pub status: EnrollmentStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for a student enrolling into a course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub group_id: Option<i64>,
}

/// DTO for the owner changing an enrollment's status.
#[derive(Debug, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub status: EnrollmentStatus,
}

/// Kind of a piece of course material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "material_kind", rename_all = "snake_case")]
pub enum MaterialKind {
    Whiteboard,
    Video,
    Pdf,
}

/// Represents the 'materials' table: one piece of course content an
/// assessment can attach to.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub kind: MaterialKind,
    pub file_url: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating course material.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub kind: MaterialKind,
    #[validate(length(max = 500), custom(function = validate_optional_url))]
    pub file_url: Option<String>,
}

/// Validates that a string, when present, is a correctly formatted URL.
fn validate_optional_url(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Consumption events recorded against materials; reduced by the analytics
/// endpoint into watch-completion and download counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "material_event_kind", rename_all = "snake_case")]
pub enum MaterialEventKind {
    VideoCompleted,
    PdfDownloaded,
}

/// Represents the 'material_events' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MaterialEvent {
    pub id: i64,
    pub material_id: i64,
    pub student_id: i64,
    pub kind: MaterialEventKind,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for recording a material event.
#[derive(Debug, Deserialize)]
pub struct MaterialEventRequest {
    pub kind: MaterialEventKind,
}

/// Kind of an assessment attached to course material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "assessment_kind", rename_all = "snake_case")]
pub enum AssessmentKind {
    Mcq,
    Listening,
}

/// Represents the 'assessments' table.
/// `course_id` is denormalized from the material for scoped scans.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub material_id: i64,
    pub course_id: i64,
    pub title: String,
    pub kind: AssessmentKind,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating an assessment on a material.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub kind: AssessmentKind,
}
