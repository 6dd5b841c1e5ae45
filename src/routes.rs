// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{attempt, docs, option, question, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Everything under `/api/quizzes` requires a bearer token.
/// * The OpenAPI document is public.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route("/questions", get(question::list_all_questions))
        .route(
            "/{quiz_id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        // Clients historically post with a trailing slash; both forms are served.
        .route("/{quiz_id}/start", post(attempt::start_attempt))
        .route("/{quiz_id}/start/", post(attempt::start_attempt))
        .route("/{quiz_id}/finish", post(attempt::finish_attempt))
        .route("/{quiz_id}/finish/", post(attempt::finish_attempt))
        .route(
            "/{quiz_id}/questions",
            get(question::list_questions).post(question::create_question),
        )
        .route(
            "/{quiz_id}/questions/{question_id}",
            get(question::get_question)
                .put(question::update_question)
                .delete(question::delete_question),
        )
        .route(
            "/{quiz_id}/questions/{question_id}/options",
            get(option::list_options).post(option::create_option),
        )
        .route(
            "/{quiz_id}/questions/{question_id}/options/{option_id}",
            get(option::get_option)
                .put(option::update_option)
                .delete(option::delete_option),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/quizzes", quiz_routes)
        .route("/api/openapi.json", get(docs::openapi_json))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
