// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use crate::{
    error::AppError,
    models::{
        course::{
            Assessment, AssessmentKind, Course, Enrollment, EnrollmentStatus, Group, Material,
            MaterialEvent, MaterialEventKind, MaterialKind,
        },
        question::{NewQuestion, Question, UpdateQuestionRequest},
        submission::{AnswerRecord, SubmissionRecord},
        user::{User, UserRole},
    },
    scoring::GradeOutcome,
};

use super::AssessmentStore;

const USER_COLUMNS: &str = "id, username, password, role, created_at";
const QUESTION_COLUMNS: &str =
    "id, assessment_id, text, kind, options, correct_answer, points, order_index, created_at";
const SUBMISSION_COLUMNS: &str =
    "id, student_id, assessment_id, score, total_points, submitted_at";
const ANSWER_COLUMNS: &str = "id, submission_id, question_id, answer, is_correct, points_earned";

/// Postgres implementation of `AssessmentStore`, wired by `main`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error, message: String) -> AppError {
    if err.to_string().contains("unique constraint") || err.to_string().contains("23505") {
        AppError::Conflict(message)
    } else {
        AppError::from(err)
    }
}

#[async_trait]
impl AssessmentStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("Username '{}' already exists", username)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_course(
        &self,
        teacher_id: i64,
        title: &str,
        description: Option<&str>,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (teacher_id, title, description) VALUES ($1, $2, $3)
             RETURNING id, teacher_id, title, description, created_at",
        )
        .bind(teacher_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, teacher_id, title, description, created_at FROM courses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn create_group(&self, course_id: i64, name: &str) -> Result<Group, AppError> {
        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO course_groups (course_id, name) VALUES ($1, $2)
             RETURNING id, course_id, name",
        )
        .bind(course_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(group)
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>, AppError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, course_id, name FROM course_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn upsert_enrollment(
        &self,
        course_id: i64,
        student_id: i64,
        group_id: Option<i64>,
    ) -> Result<Enrollment, AppError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "INSERT INTO enrollments (course_id, student_id, group_id) VALUES ($1, $2, $3)
             ON CONFLICT (course_id, student_id) DO UPDATE SET group_id = EXCLUDED.group_id
             RETURNING id, course_id, student_id, group_id, status, created_at",
        )
        .bind(course_id)
        .bind(student_id)
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn enrollment_for(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>, AppError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT id, course_id, student_id, group_id, status, created_at
             FROM enrollments WHERE course_id = $1 AND student_id = $2",
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn set_enrollment_status(
        &self,
        course_id: i64,
        student_id: i64,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, AppError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "UPDATE enrollments SET status = $3 WHERE course_id = $1 AND student_id = $2
             RETURNING id, course_id, student_id, group_id, status, created_at",
        )
        .bind(course_id)
        .bind(student_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn list_enrollments(
        &self,
        course_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<Enrollment>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, course_id, student_id, group_id, status, created_at
             FROM enrollments WHERE course_id = ",
        );
        builder.push_bind(course_id);
        if let Some(group_id) = group_id {
            builder.push(" AND group_id = ");
            builder.push_bind(group_id);
        }
        builder.push(" ORDER BY id");

        let enrollments = builder
            .build_query_as::<Enrollment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(enrollments)
    }

    async fn create_material(
        &self,
        course_id: i64,
        title: &str,
        kind: MaterialKind,
        file_url: Option<&str>,
    ) -> Result<Material, AppError> {
        let material = sqlx::query_as::<_, Material>(
            "INSERT INTO materials (course_id, title, kind, file_url) VALUES ($1, $2, $3, $4)
             RETURNING id, course_id, title, kind, file_url, created_at",
        )
        .bind(course_id)
        .bind(title)
        .bind(kind)
        .bind(file_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(material)
    }

    async fn get_material(&self, id: i64) -> Result<Option<Material>, AppError> {
        let material = sqlx::query_as::<_, Material>(
            "SELECT id, course_id, title, kind, file_url, created_at FROM materials WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(material)
    }

    async fn record_material_event(
        &self,
        material_id: i64,
        student_id: i64,
        kind: MaterialEventKind,
    ) -> Result<MaterialEvent, AppError> {
        let event = sqlx::query_as::<_, MaterialEvent>(
            "INSERT INTO material_events (material_id, student_id, kind) VALUES ($1, $2, $3)
             RETURNING id, material_id, student_id, kind, created_at",
        )
        .bind(material_id)
        .bind(student_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn list_material_events(&self, course_id: i64) -> Result<Vec<MaterialEvent>, AppError> {
        let events = sqlx::query_as::<_, MaterialEvent>(
            "SELECT e.id, e.material_id, e.student_id, e.kind, e.created_at
             FROM material_events e
             JOIN materials m ON e.material_id = m.id
             WHERE m.course_id = $1
             ORDER BY e.id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn create_assessment(
        &self,
        material_id: i64,
        course_id: i64,
        title: &str,
        kind: AssessmentKind,
    ) -> Result<Assessment, AppError> {
        let assessment = sqlx::query_as::<_, Assessment>(
            "INSERT INTO assessments (material_id, course_id, title, kind) VALUES ($1, $2, $3, $4)
             RETURNING id, material_id, course_id, title, kind, created_at",
        )
        .bind(material_id)
        .bind(course_id)
        .bind(title)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(assessment)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        let assessment = sqlx::query_as::<_, Assessment>(
            "SELECT id, material_id, course_id, title, kind, created_at
             FROM assessments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assessment)
    }

    async fn count_assessments(&self, course_id: i64) -> Result<usize, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assessments WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as usize)
    }

    async fn create_question(
        &self,
        assessment_id: i64,
        question: &NewQuestion,
    ) -> Result<Question, AppError> {
        let record = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions
             (assessment_id, text, kind, options, correct_answer, points, order_index)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(assessment_id)
        .bind(&question.text)
        .bind(question.kind)
        .bind(Json(&question.options))
        .bind(&question.correct_answer)
        .bind(question.points)
        .bind(question.order_index)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {} FROM questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn update_question(
        &self,
        id: i64,
        patch: &UpdateQuestionRequest,
    ) -> Result<bool, AppError> {
        if patch.text.is_none()
            && patch.options.is_none()
            && patch.correct_answer.is_none()
            && patch.points.is_none()
            && patch.order_index.is_none()
        {
            return Ok(true);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
        let mut separated = builder.separated(", ");

        if let Some(text) = &patch.text {
            separated.push("text = ");
            separated.push_bind_unseparated(text.as_str());
        }

        if let Some(options) = &patch.options {
            separated.push("options = ");
            separated.push_bind_unseparated(Json(options.clone()));
        }

        if let Some(correct_answer) = &patch.correct_answer {
            separated.push("correct_answer = ");
            separated.push_bind_unseparated(correct_answer.as_str());
        }

        if let Some(points) = patch.points {
            separated.push("points = ");
            separated.push_bind_unseparated(points);
        }

        if let Some(order_index) = patch.order_index {
            separated.push("order_index = ");
            separated.push_bind_unseparated(order_index);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_question_bank(&self, assessment_id: i64) -> Result<Vec<Question>, AppError> {
        let bank = sqlx::query_as::<_, Question>(&format!(
            "SELECT {} FROM questions WHERE assessment_id = $1 ORDER BY order_index, id",
            QUESTION_COLUMNS
        ))
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bank)
    }

    async fn insert_submission(
        &self,
        student_id: i64,
        assessment_id: i64,
        outcome: &GradeOutcome,
    ) -> Result<(SubmissionRecord, Vec<AnswerRecord>), AppError> {
        // One transaction for the record and its answer rows: a partial
        // submission must never become visible to later reads.
        let mut tx = self.pool.begin().await?;

        let submission = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "INSERT INTO submissions (student_id, assessment_id, score, total_points)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            SUBMISSION_COLUMNS
        ))
        .bind(student_id)
        .bind(assessment_id)
        .bind(outcome.score)
        .bind(outcome.total_points)
        .fetch_one(&mut *tx)
        .await?;

        let records = if outcome.answers.is_empty() {
            Vec::new()
        } else {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO answer_records
                 (submission_id, question_id, answer, is_correct, points_earned) ",
            );
            builder.push_values(outcome.answers.iter(), |mut b, a| {
                b.push_bind(submission.id)
                    .push_bind(a.question_id)
                    .push_bind(a.answer.as_str())
                    .push_bind(a.is_correct)
                    .push_bind(a.points_earned);
            });
            builder.push(&format!(" RETURNING {}", ANSWER_COLUMNS));

            builder
                .build_query_as::<AnswerRecord>()
                .fetch_all(&mut *tx)
                .await?
        };

        tx.commit().await?;

        Ok((submission, records))
    }

    async fn get_submission(
        &self,
        id: i64,
    ) -> Result<Option<(SubmissionRecord, Vec<AnswerRecord>)>, AppError> {
        let submission = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "SELECT {} FROM submissions WHERE id = $1",
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(submission) = submission else {
            return Ok(None);
        };

        let records = sqlx::query_as::<_, AnswerRecord>(&format!(
            "SELECT {} FROM answer_records WHERE submission_id = $1 ORDER BY id",
            ANSWER_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((submission, records)))
    }

    async fn list_course_submissions(
        &self,
        course_id: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError> {
        let records = sqlx::query_as::<_, SubmissionRecord>(
            "SELECT s.id, s.student_id, s.assessment_id, s.score, s.total_points, s.submitted_at
             FROM submissions s
             JOIN assessments a ON s.assessment_id = a.id
             WHERE a.course_id = $1
             ORDER BY s.submitted_at, s.id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
