// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

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

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// The persistence boundary of the scoring engine.
///
/// Handlers only see this trait; `main` wires the Postgres implementation,
/// tests and local development use the in-memory one. `insert_submission`
/// is the only compound write and must be atomic: either the submission and
/// all of its answer records land, or nothing does.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    // users
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    // courses and groups
    async fn create_course(
        &self,
        teacher_id: i64,
        title: &str,
        description: Option<&str>,
    ) -> Result<Course, AppError>;
    async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError>;
    async fn create_group(&self, course_id: i64, name: &str) -> Result<Group, AppError>;
    async fn get_group(&self, id: i64) -> Result<Option<Group>, AppError>;

    // enrollments
    async fn upsert_enrollment(
        &self,
        course_id: i64,
        student_id: i64,
        group_id: Option<i64>,
    ) -> Result<Enrollment, AppError>;
    async fn enrollment_for(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>, AppError>;
    async fn set_enrollment_status(
        &self,
        course_id: i64,
        student_id: i64,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, AppError>;
    async fn list_enrollments(
        &self,
        course_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<Enrollment>, AppError>;

    // materials and consumption events
    async fn create_material(
        &self,
        course_id: i64,
        title: &str,
        kind: MaterialKind,
        file_url: Option<&str>,
    ) -> Result<Material, AppError>;
    async fn get_material(&self, id: i64) -> Result<Option<Material>, AppError>;
    async fn record_material_event(
        &self,
        material_id: i64,
        student_id: i64,
        kind: MaterialEventKind,
    ) -> Result<MaterialEvent, AppError>;
    async fn list_material_events(&self, course_id: i64) -> Result<Vec<MaterialEvent>, AppError>;

    // assessments
    async fn create_assessment(
        &self,
        material_id: i64,
        course_id: i64,
        title: &str,
        kind: AssessmentKind,
    ) -> Result<Assessment, AppError>;
    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError>;
    async fn count_assessments(&self, course_id: i64) -> Result<usize, AppError>;

    // questions
    async fn create_question(
        &self,
        assessment_id: i64,
        question: &NewQuestion,
    ) -> Result<Question, AppError>;
    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError>;
    async fn update_question(
        &self,
        id: i64,
        patch: &UpdateQuestionRequest,
    ) -> Result<bool, AppError>;
    async fn delete_question(&self, id: i64) -> Result<bool, AppError>;
    /// Questions of one assessment, ordered by `order_index` then id.
    async fn load_question_bank(&self, assessment_id: i64) -> Result<Vec<Question>, AppError>;

    // submissions
    async fn insert_submission(
        &self,
        student_id: i64,
        assessment_id: i64,
        outcome: &GradeOutcome,
    ) -> Result<(SubmissionRecord, Vec<AnswerRecord>), AppError>;
    async fn get_submission(
        &self,
        id: i64,
    ) -> Result<Option<(SubmissionRecord, Vec<AnswerRecord>)>, AppError>;
    /// All submissions against assessments of one course, oldest first.
    async fn list_course_submissions(
        &self,
        course_id: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError>;
}
