// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, auth, courses, questions, submissions},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public auth routes; authoring routes behind auth + teacher role;
///   learner routes behind auth only (ownership and enrollment predicates
///   are checked inside the handlers).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let authoring_routes = Router::new()
        .route("/courses", post(courses::create_course))
        .route("/courses/{id}/groups", post(courses::create_group))
        .route(
            "/courses/{course_id}/enrollments/{student_id}",
            put(courses::update_enrollment),
        )
        .route("/courses/{id}/materials", post(courses::create_material))
        .route("/courses/{id}/analytics", get(analytics::course_summary))
        .route(
            "/materials/{id}/assessments",
            post(questions::create_assessment),
        )
        .route(
            "/assessments/{id}/questions",
            post(questions::create_question),
        )
        .route(
            "/questions/{id}",
            put(questions::update_question).delete(questions::delete_question),
        )
        // Double middleware protection: Auth first, then role check
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let learner_routes = Router::new()
        .route("/courses/{id}/enroll", post(courses::enroll))
        .route("/courses/{id}/ranking", get(analytics::ranking))
        .route(
            "/materials/{id}/events",
            post(courses::record_material_event),
        )
        .route("/assessments/{id}/questions", get(questions::list_questions))
        .route("/assessments/{id}/submit", post(submissions::submit))
        .route("/submissions/{id}", get(submissions::get_submission))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", authoring_routes.merge(learner_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
