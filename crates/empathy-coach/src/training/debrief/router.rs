use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{DebriefService, DebriefServiceError};
use super::store::SessionStore;

/// Router builder exposing the debrief flow as JSON endpoints.
pub fn debrief_router<S>(service: Arc<DebriefService<S>>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/debrief/session", get(view_handler::<S>))
        .route("/api/v1/debrief/session/answers", post(answer_handler::<S>))
        .route("/api/v1/debrief/session/advance", post(advance_handler::<S>))
        .route("/api/v1/debrief/session/rerun", post(begin_rerun_handler::<S>))
        .route(
            "/api/v1/debrief/session/rerun/answers",
            post(rerun_answer_handler::<S>),
        )
        .route(
            "/api/v1/debrief/session/rerun/complete",
            post(complete_rerun_handler::<S>),
        )
        .route(
            "/api/v1/debrief/session/rerun/back-out",
            post(back_out_handler::<S>),
        )
        .route("/api/v1/debrief/session/notes", post(notes_handler::<S>))
        .route("/api/v1/debrief/session/restart", post(restart_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerRequest {
    pub(crate) line_index: usize,
    pub(crate) option_index: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesRequest {
    pub(crate) reflection_notes: Option<String>,
}

fn error_response(error: DebriefServiceError) -> Response {
    let status = match &error {
        DebriefServiceError::Selection(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DebriefServiceError::Transition(_) => StatusCode::CONFLICT,
        DebriefServiceError::Script(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn respond(result: Result<super::service::DebriefView, DebriefServiceError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn view_handler<S>(State(service): State<Arc<DebriefService<S>>>) -> Response
where
    S: SessionStore + 'static,
{
    (StatusCode::OK, axum::Json(service.view())).into_response()
}

pub(crate) async fn answer_handler<S>(
    State(service): State<Arc<DebriefService<S>>>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    respond(service.answer(request.line_index, request.option_index))
}

pub(crate) async fn advance_handler<S>(State(service): State<Arc<DebriefService<S>>>) -> Response
where
    S: SessionStore + 'static,
{
    respond(service.advance_to_debrief())
}

pub(crate) async fn begin_rerun_handler<S>(
    State(service): State<Arc<DebriefService<S>>>,
) -> Response
where
    S: SessionStore + 'static,
{
    respond(service.begin_rerun())
}

pub(crate) async fn rerun_answer_handler<S>(
    State(service): State<Arc<DebriefService<S>>>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    respond(service.answer_rerun(request.line_index, request.option_index))
}

pub(crate) async fn complete_rerun_handler<S>(
    State(service): State<Arc<DebriefService<S>>>,
) -> Response
where
    S: SessionStore + 'static,
{
    respond(service.complete_rerun())
}

pub(crate) async fn back_out_handler<S>(State(service): State<Arc<DebriefService<S>>>) -> Response
where
    S: SessionStore + 'static,
{
    respond(service.back_out())
}

pub(crate) async fn notes_handler<S>(
    State(service): State<Arc<DebriefService<S>>>,
    axum::Json(request): axum::Json<NotesRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    respond(service.set_reflection_notes(request.reflection_notes))
}

pub(crate) async fn restart_handler<S>(State(service): State<Arc<DebriefService<S>>>) -> Response
where
    S: SessionStore + 'static,
{
    (StatusCode::OK, axum::Json(service.restart())).into_response()
}
