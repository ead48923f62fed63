// src/store/memory.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use sqlx::types::Json;
use tokio::sync::RwLock;

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

/// In-memory implementation of `AssessmentStore`.
///
/// Used by the integration tests and for local development without a
/// database. The submission write path takes both write locks before
/// mutating, so a failed insert can never leave a half-written attempt
/// visible to readers.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<i64, User>>,
    courses: RwLock<HashMap<i64, Course>>,
    groups: RwLock<HashMap<i64, Group>>,
    enrollments: RwLock<Vec<Enrollment>>,
    materials: RwLock<HashMap<i64, Material>>,
    material_events: RwLock<Vec<MaterialEvent>>,
    assessments: RwLock<HashMap<i64, Assessment>>,
    questions: RwLock<HashMap<i64, Question>>,
    submissions: RwLock<HashMap<i64, SubmissionRecord>>,
    answer_records: RwLock<Vec<AnswerRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }
        let user = User {
            id: self.next_id(),
            username: username.to_string(),
            password: password_hash.to_string(),
            role,
            created_at: Some(chrono::Utc::now()),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn create_course(
        &self,
        teacher_id: i64,
        title: &str,
        description: Option<&str>,
    ) -> Result<Course, AppError> {
        let course = Course {
            id: self.next_id(),
            teacher_id,
            title: title.to_string(),
            description: description.map(|d| d.to_string()),
            created_at: Some(chrono::Utc::now()),
        };
        self.courses.write().await.insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError> {
        Ok(self.courses.read().await.get(&id).cloned())
    }

    async fn create_group(&self, course_id: i64, name: &str) -> Result<Group, AppError> {
        let group = Group {
            id: self.next_id(),
            course_id,
            name: name.to_string(),
        };
        self.groups.write().await.insert(group.id, group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>, AppError> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn upsert_enrollment(
        &self,
        course_id: i64,
        student_id: i64,
        group_id: Option<i64>,
    ) -> Result<Enrollment, AppError> {
        let mut enrollments = self.enrollments.write().await;
        if let Some(existing) = enrollments
            .iter_mut()
            .find(|e| e.course_id == course_id && e.student_id == student_id)
        {
            existing.group_id = group_id;
            return Ok(existing.clone());
        }
        let enrollment = Enrollment {
            id: self.next_id(),
            course_id,
            student_id,
            group_id,
            status: EnrollmentStatus::Active,
            created_at: Some(chrono::Utc::now()),
        };
        enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn enrollment_for(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>, AppError> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments
            .iter()
            .find(|e| e.course_id == course_id && e.student_id == student_id)
            .cloned())
    }

    async fn set_enrollment_status(
        &self,
        course_id: i64,
        student_id: i64,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, AppError> {
        let mut enrollments = self.enrollments.write().await;
        match enrollments
            .iter_mut()
            .find(|e| e.course_id == course_id && e.student_id == student_id)
        {
            Some(enrollment) => {
                enrollment.status = status;
                Ok(Some(enrollment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list_enrollments(
        &self,
        course_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<Enrollment>, AppError> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .filter(|e| group_id.is_none() || e.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn create_material(
        &self,
        course_id: i64,
        title: &str,
        kind: MaterialKind,
        file_url: Option<&str>,
    ) -> Result<Material, AppError> {
        let material = Material {
            id: self.next_id(),
            course_id,
            title: title.to_string(),
            kind,
            file_url: file_url.map(|u| u.to_string()),
            created_at: Some(chrono::Utc::now()),
        };
        self.materials
            .write()
            .await
            .insert(material.id, material.clone());
        Ok(material)
    }

    async fn get_material(&self, id: i64) -> Result<Option<Material>, AppError> {
        Ok(self.materials.read().await.get(&id).cloned())
    }

    async fn record_material_event(
        &self,
        material_id: i64,
        student_id: i64,
        kind: MaterialEventKind,
    ) -> Result<MaterialEvent, AppError> {
        let event = MaterialEvent {
            id: self.next_id(),
            material_id,
            student_id,
            kind,
            created_at: Some(chrono::Utc::now()),
        };
        self.material_events.write().await.push(event.clone());
        Ok(event)
    }

    async fn list_material_events(&self, course_id: i64) -> Result<Vec<MaterialEvent>, AppError> {
        let materials = self.materials.read().await;
        let events = self.material_events.read().await;
        Ok(events
            .iter()
            .filter(|e| {
                materials
                    .get(&e.material_id)
                    .map(|m| m.course_id == course_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn create_assessment(
        &self,
        material_id: i64,
        course_id: i64,
        title: &str,
        kind: AssessmentKind,
    ) -> Result<Assessment, AppError> {
        let assessment = Assessment {
            id: self.next_id(),
            material_id,
            course_id,
            title: title.to_string(),
            kind,
            created_at: Some(chrono::Utc::now()),
        };
        self.assessments
            .write()
            .await
            .insert(assessment.id, assessment.clone());
        Ok(assessment)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        Ok(self.assessments.read().await.get(&id).cloned())
    }

    async fn count_assessments(&self, course_id: i64) -> Result<usize, AppError> {
        let assessments = self.assessments.read().await;
        Ok(assessments
            .values()
            .filter(|a| a.course_id == course_id)
            .count())
    }

    async fn create_question(
        &self,
        assessment_id: i64,
        question: &NewQuestion,
    ) -> Result<Question, AppError> {
        let record = Question {
            id: self.next_id(),
            assessment_id,
            text: question.text.clone(),
            kind: question.kind,
            options: Json(question.options.clone()),
            correct_answer: question.correct_answer.clone(),
            points: question.points,
            order_index: question.order_index,
            created_at: Some(chrono::Utc::now()),
        };
        self.questions
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.questions.read().await.get(&id).cloned())
    }

    async fn update_question(
        &self,
        id: i64,
        patch: &UpdateQuestionRequest,
    ) -> Result<bool, AppError> {
        let mut questions = self.questions.write().await;
        let Some(question) = questions.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(text) = &patch.text {
            question.text = text.clone();
        }
        if let Some(options) = &patch.options {
            question.options = Json(options.clone());
        }
        if let Some(correct_answer) = &patch.correct_answer {
            question.correct_answer = correct_answer.clone();
        }
        if let Some(points) = patch.points {
            question.points = points;
        }
        if let Some(order_index) = patch.order_index {
            question.order_index = order_index;
        }
        Ok(true)
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.questions.write().await.remove(&id).is_some())
    }

    async fn load_question_bank(&self, assessment_id: i64) -> Result<Vec<Question>, AppError> {
        let questions = self.questions.read().await;
        let mut bank: Vec<Question> = questions
            .values()
            .filter(|q| q.assessment_id == assessment_id)
            .cloned()
            .collect();
        bank.sort_by_key(|q| (q.order_index, q.id));
        Ok(bank)
    }

    async fn insert_submission(
        &self,
        student_id: i64,
        assessment_id: i64,
        outcome: &GradeOutcome,
    ) -> Result<(SubmissionRecord, Vec<AnswerRecord>), AppError> {
        // Both locks held for the duration of the write: readers never see
        // a submission without its answer records.
        let mut submissions = self.submissions.write().await;
        let mut answer_records = self.answer_records.write().await;

        let submission = SubmissionRecord {
            id: self.next_id(),
            student_id,
            assessment_id,
            score: outcome.score,
            total_points: outcome.total_points,
            submitted_at: chrono::Utc::now(),
        };

        let records: Vec<AnswerRecord> = outcome
            .answers
            .iter()
            .map(|a| AnswerRecord {
                id: self.next_id(),
                submission_id: submission.id,
                question_id: a.question_id,
                answer: a.answer.clone(),
                is_correct: a.is_correct,
                points_earned: a.points_earned,
            })
            .collect();

        submissions.insert(submission.id, submission.clone());
        answer_records.extend(records.clone());

        Ok((submission, records))
    }

    async fn get_submission(
        &self,
        id: i64,
    ) -> Result<Option<(SubmissionRecord, Vec<AnswerRecord>)>, AppError> {
        let submissions = self.submissions.read().await;
        let Some(submission) = submissions.get(&id).cloned() else {
            return Ok(None);
        };
        let answer_records = self.answer_records.read().await;
        let records: Vec<AnswerRecord> = answer_records
            .iter()
            .filter(|r| r.submission_id == id)
            .cloned()
            .collect();
        Ok(Some((submission, records)))
    }

    async fn list_course_submissions(
        &self,
        course_id: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError> {
        let assessments = self.assessments.read().await;
        let submissions = self.submissions.read().await;
        let mut records: Vec<SubmissionRecord> = submissions
            .values()
            .filter(|s| {
                assessments
                    .get(&s.assessment_id)
                    .map(|a| a.course_id == course_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        records.sort_by_key(|s| s.id);
        Ok(records)
    }
}
