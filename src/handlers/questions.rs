// src/handlers/questions.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::{Assessment, CreateAssessmentRequest, EnrollmentStatus},
        question::{
            CreateQuestionRequest, NewQuestion, PublicQuestion, Question, UpdateQuestionRequest,
        },
    },
    scoring::{kind_allowed, validate_question_content},
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

use super::require_course_owner;

/// Loads an assessment and verifies the caller owns its course.
async fn require_assessment_owner(
    state: &AppState,
    assessment_id: i64,
    claims: &Claims,
) -> Result<Assessment, AppError> {
    let assessment = state
        .store
        .get_assessment(assessment_id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    require_course_owner(state.store.as_ref(), assessment.course_id, claims).await?;

    Ok(assessment)
}

/// Creates an assessment (MCQ or listening test) on a material. Owner only.
pub async fn create_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(material_id): Path<i64>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let material = state
        .store
        .get_material(material_id)
        .await?
        .ok_or(AppError::NotFound("Material not found".to_string()))?;

    require_course_owner(state.store.as_ref(), material.course_id, &claims).await?;

    let assessment = state
        .store
        .create_assessment(
            material_id,
            material.course_id,
            &clean_html(&payload.title),
            payload.kind,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(assessment)))
}

/// Creates a question on an assessment. Owner only.
///
/// Content rules are enforced here, at creation time, never at grading
/// time: MCQ questions need at least two non-empty options and the correct
/// answer must be one of them.
pub async fn create_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let assessment = require_assessment_owner(&state, assessment_id, &claims).await?;

    if !kind_allowed(assessment.kind, payload.kind) {
        return Err(AppError::Validation(
            "Question kind is not allowed on this assessment".to_string(),
        ));
    }

    let points = payload.points.unwrap_or(1);
    validate_question_content(payload.kind, &payload.options, &payload.correct_answer, points)?;

    let order_index = match payload.order_index {
        Some(idx) => idx,
        None => state.store.load_question_bank(assessment_id).await?.len() as i32,
    };

    let question = state
        .store
        .create_question(
            assessment_id,
            &NewQuestion {
                text: clean_html(&payload.text),
                kind: payload.kind,
                options: payload.options,
                correct_answer: payload.correct_answer,
                points,
                order_index,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Updates a question. Owner only.
/// The merged result is re-validated so an update can never leave an MCQ
/// question without its answer among the options.
pub async fn update_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .store
        .get_question(id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    require_assessment_owner(&state, question.assessment_id, &claims).await?;

    let options = payload.options.as_ref().unwrap_or(&question.options.0);
    let correct_answer = payload
        .correct_answer
        .as_deref()
        .unwrap_or(&question.correct_answer);
    let points = payload.points.unwrap_or(question.points);
    validate_question_content(question.kind, options, correct_answer, points)?;

    if let Some(text) = &payload.text {
        payload.text = Some(clean_html(text));
    }

    state.store.update_question(id, &payload).await?;

    Ok(StatusCode::OK)
}

/// Deletes a question. Owner only.
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .store
        .get_question(id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    require_assessment_owner(&state, question.assessment_id, &claims).await?;

    state.store.delete_question(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists an assessment's questions without the correct answers.
/// Visible to the course owner and actively enrolled students.
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state
        .store
        .get_assessment(assessment_id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    let course = state
        .store
        .get_course(assessment.course_id)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if course.teacher_id != claims.user_id() {
        let enrollment = state
            .store
            .enrollment_for(course.id, claims.user_id())
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

    let bank: Vec<Question> = state.store.load_question_bank(assessment_id).await?;
    let public: Vec<PublicQuestion> = bank.into_iter().map(PublicQuestion::from).collect();

    Ok(Json(public))
}
