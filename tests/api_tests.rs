// tests/api_tests.rs

use std::sync::Arc;

use lms_backend::{config::Config, routes, state::AppState, store::MemoryStore};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let config = Config {
        database_url: "postgres://unused-in-tests".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
    };

    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers a user with the given role and logs in.
/// Returns (token, user_id).
async fn register_and_login(client: &reqwest::Client, address: &str, role: &str) -> (String, i64) {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let resp = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password,
            "role": role
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    let token = login["token"].as_str().expect("Token not found").to_string();
    let user_id = login["user_id"].as_i64().expect("user_id not found");
    (token, user_id)
}

/// Creates a course, a whiteboard material and an MCQ assessment.
/// Returns (course_id, material_id, assessment_id).
async fn create_assessment(
    client: &reqwest::Client,
    address: &str,
    teacher_token: &str,
) -> (i64, i64, i64) {
    let course: serde_json::Value = client
        .post(format!("{}/api/courses", address))
        .bearer_auth(teacher_token)
        .json(&serde_json::json!({ "title": "Geography 101" }))
        .send()
        .await
        .expect("Create course failed")
        .json()
        .await
        .unwrap();
    let course_id = course["id"].as_i64().unwrap();

    let material: serde_json::Value = client
        .post(format!("{}/api/courses/{}/materials", address, course_id))
        .bearer_auth(teacher_token)
        .json(&serde_json::json!({ "title": "Capitals", "kind": "whiteboard" }))
        .send()
        .await
        .expect("Create material failed")
        .json()
        .await
        .unwrap();
    let material_id = material["id"].as_i64().unwrap();

    let assessment: serde_json::Value = client
        .post(format!("{}/api/materials/{}/assessments", address, material_id))
        .bearer_auth(teacher_token)
        .json(&serde_json::json!({ "title": "Capitals quiz", "kind": "mcq" }))
        .send()
        .await
        .expect("Create assessment failed")
        .json()
        .await
        .unwrap();
    let assessment_id = assessment["id"].as_i64().unwrap();

    (course_id, material_id, assessment_id)
}

async fn add_question(
    client: &reqwest::Client,
    address: &str,
    teacher_token: &str,
    assessment_id: i64,
    text: &str,
    options: &[&str],
    correct: &str,
    points: i32,
) -> i64 {
    let resp = client
        .post(format!("{}/api/assessments/{}/questions", address, assessment_id))
        .bearer_auth(teacher_token)
        .json(&serde_json::json!({
            "text": text,
            "kind": "multiple_choice",
            "options": options,
            "correct_answer": correct,
            "points": points
        }))
        .send()
        .await
        .expect("Create question failed");
    assert_eq!(resp.status().as_u16(), 201);

    let question: serde_json::Value = resp.json().await.unwrap();
    question["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_check_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let payload = serde_json::json!({
        "username": "duplicated_name",
        "password": "password123",
        "role": "student"
    });

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/courses", address))
        .json(&serde_json::json!({ "title": "No token" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn students_cannot_author_courses() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (student_token, _) = register_and_login(&client, &address, "student").await;

    let response = client
        .post(format!("{}/api/courses", address))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({ "title": "Not mine to create" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn only_the_owner_may_author_questions() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (owner_token, _) = register_and_login(&client, &address, "teacher").await;
    let (other_token, _) = register_and_login(&client, &address, "teacher").await;
    let (_, _, assessment_id) = create_assessment(&client, &address, &owner_token).await;

    let response = client
        .post(format!("{}/api/assessments/{}/questions", address, assessment_id))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({
            "text": "Q",
            "kind": "multiple_choice",
            "options": ["A", "B"],
            "correct_answer": "A"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn mcq_question_validation_rules() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (teacher_token, _) = register_and_login(&client, &address, "teacher").await;
    let (_, _, assessment_id) = create_assessment(&client, &address, &teacher_token).await;

    // Fewer than 2 valid options after trim
    let resp = client
        .post(format!("{}/api/assessments/{}/questions", address, assessment_id))
        .bearer_auth(&teacher_token)
        .json(&serde_json::json!({
            "text": "Broken",
            "kind": "multiple_choice",
            "options": ["A", ""],
            "correct_answer": "A"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Correct answer not among options
    let resp = client
        .post(format!("{}/api/assessments/{}/questions", address, assessment_id))
        .bearer_auth(&teacher_token)
        .json(&serde_json::json!({
            "text": "Broken",
            "kind": "multiple_choice",
            "options": ["A", "B"],
            "correct_answer": "C"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Non-MCQ kinds are rejected on an MCQ assessment
    let resp = client
        .post(format!("{}/api/assessments/{}/questions", address, assessment_id))
        .bearer_auth(&teacher_token)
        .json(&serde_json::json!({
            "text": "Essay",
            "kind": "short_answer",
            "correct_answer": "Paris"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn submit_flow_grades_and_persists() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (teacher_token, _) = register_and_login(&client, &address, "teacher").await;
    let (student_token, _) = register_and_login(&client, &address, "student").await;
    let (course_id, _, assessment_id) = create_assessment(&client, &address, &teacher_token).await;

    let q1 = add_question(
        &client, &address, &teacher_token, assessment_id,
        "Which is a feline?", &["Cat", "Dog"], "Cat", 1,
    )
    .await;
    let q2 = add_question(
        &client, &address, &teacher_token, assessment_id,
        "Pick blue", &["Red", "Blue", "Green"], "Blue", 2,
    )
    .await;

    // Enroll the student
    let resp = client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    // Students see questions without the answers
    let questions: Vec<serde_json::Value> = client
        .get(format!("{}/api/assessments/{}/questions", address, assessment_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions[0].get("correct_answer").is_none());

    // Submit: q1 correct (case-insensitive), q2 wrong
    let resp = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({
            "answers": [
                { "question_id": q1, "answer": "cat" },
                { "question_id": q2, "answer": "Green" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let result: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(result["total_points"], 3);
    assert_eq!(result["results"][q1.to_string()], true);
    assert_eq!(result["results"][q2.to_string()], false);

    // The stored submission carries one answer record per bank question
    let submission_id = result["submission_id"].as_i64().unwrap();
    let stored: serde_json::Value = client
        .get(format!("{}/api/submissions/{}", address, submission_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["submission"]["score"], 1);
    assert_eq!(stored["answers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn submit_requires_active_enrollment() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (teacher_token, _) = register_and_login(&client, &address, "teacher").await;
    let (student_token, student_id) = register_and_login(&client, &address, "student").await;
    let (course_id, _, assessment_id) = create_assessment(&client, &address, &teacher_token).await;

    add_question(
        &client, &address, &teacher_token, assessment_id,
        "Q", &["A", "B"], "A", 1,
    )
    .await;

    let answers = serde_json::json!({
        "answers": [ { "question_id": 1, "answer": "A" } ]
    });

    // Not enrolled at all
    let resp = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .bearer_auth(&student_token)
        .json(&answers)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Enrolled but blocked by the owner
    client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    let resp = client
        .put(format!(
            "{}/api/courses/{}/enrollments/{}",
            address, course_id, student_id
        ))
        .bearer_auth(&teacher_token)
        .json(&serde_json::json!({ "status": "blocked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .bearer_auth(&student_token)
        .json(&answers)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn submit_rejects_empty_payload_and_empty_bank() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (teacher_token, _) = register_and_login(&client, &address, "teacher").await;
    let (student_token, _) = register_and_login(&client, &address, "student").await;
    let (course_id, _, assessment_id) = create_assessment(&client, &address, &teacher_token).await;

    client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    // Assessment exists but has no questions yet
    let resp = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({ "answers": [ { "question_id": 1, "answer": "A" } ] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    add_question(
        &client, &address, &teacher_token, assessment_id,
        "Q", &["A", "B"], "A", 1,
    )
    .await;

    // Empty answers payload
    let resp = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({ "answers": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Answers are required");
}

#[tokio::test]
async fn resubmission_creates_an_independent_attempt() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (teacher_token, _) = register_and_login(&client, &address, "teacher").await;
    let (student_token, _) = register_and_login(&client, &address, "student").await;
    let (course_id, _, assessment_id) = create_assessment(&client, &address, &teacher_token).await;

    let q1 = add_question(
        &client, &address, &teacher_token, assessment_id,
        "Q", &["A", "B"], "A", 1,
    )
    .await;

    client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    let mut ids = Vec::new();
    for answer in ["B", "A"] {
        let result: serde_json::Value = client
            .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
            .bearer_auth(&student_token)
            .json(&serde_json::json!({
                "answers": [ { "question_id": q1, "answer": answer } ]
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        ids.push(result["submission_id"].as_i64().unwrap());
    }

    assert_ne!(ids[0], ids[1]);
}
