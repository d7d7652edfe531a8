//! JSON API handlers.
//!
//! Every handler that reaches the model is bounded by the state's request
//! timeout. Failures map to a fixed body shape:
//! `{"error": <code>, "message": <text>}`.

use std::future::Future;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::media::{self, IMAGE_FAILED, ImageRequest, SPEECH_FAILED, SpeechRequest};
use crate::sources::{IngestError, UPLOAD_FAILED, text_source};
use crate::tools::{self, Tool};

const CHAT_FAILED: &str = "Failed to get an answer. Please try again.";
const TIMED_OUT: &str = "The request took too long. Please try again.";
const HEALTH_PING_TIMEOUT: Duration = Duration::from_secs(5);

// ── Helpers ───────────────────────────────────────────────────────────────────

pub(super) fn json_error(code: &str, message: impl Into<String>) -> Json<Value> {
    Json(json!({ "error": code, "message": message.into() }))
}

/// Map an error to a response. `failure` is the user-facing text for
/// anything that is not the caller's fault.
fn error_response(err: &AppError, failure: &str) -> Response {
    match err {
        AppError::Validation(v) if v.is_input() => {
            (StatusCode::UNPROCESSABLE_ENTITY, json_error("validation", v.to_string())).into_response()
        }
        AppError::Ingest(e @ IngestError::MissingField(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, json_error("validation", e.to_string())).into_response()
        }
        AppError::NotFound(what) => {
            (StatusCode::NOT_FOUND, json_error("not_found", format!("{what} not found"))).into_response()
        }
        other => {
            warn!(error = %other, "request failed");
            (StatusCode::BAD_GATEWAY, json_error("failed", failure)).into_response()
        }
    }
}

/// Run `work` under `timeout` and turn its outcome into a response.
async fn respond<T, F>(timeout: Duration, status: StatusCode, failure: &str, work: F) -> Response
where
    T: Serialize,
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(timeout, work).await {
        Ok(Ok(_)) if status == StatusCode::NO_CONTENT => status.into_response(),
        Ok(Ok(body)) => (status, Json(body)).into_response(),
        Ok(Err(e)) => error_response(&e, failure),
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "request timed out");
            (StatusCode::GATEWAY_TIMEOUT, json_error("timeout", TIMED_OUT)).into_response()
        }
    }
}

/// Map a body rejection. An oversized body is reported with the handler's
/// own `failure` text rather than the extractor's.
fn bad_body(rejection: JsonRejection, failure: &str) -> Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %rejection.body_text(), "request body too large");
        return (StatusCode::PAYLOAD_TOO_LARGE, json_error("too_large", failure)).into_response();
    }
    (StatusCode::UNPROCESSABLE_ENTITY, json_error("invalid_request", rejection.body_text())).into_response()
}

/// Unparseable ids cannot name an existing notebook.
fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{what} {raw}")))
}

// ── Catalog & health ──────────────────────────────────────────────────────────

pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    let reachable = matches!(
        tokio::time::timeout(HEALTH_PING_TIMEOUT, state.llm.ping()).await,
        Ok(Ok(()))
    );
    Json(json!({
        "status": "ok",
        "studio": state.studio_name.as_ref(),
        "provider": state.llm.name(),
        "model": state.llm.model(),
        "llm_reachable": reachable,
        "notebooks": state.notebooks.len(),
    }))
}

pub(super) async fn tools() -> Json<Vec<tools::ToolInfo>> {
    Json(tools::catalog())
}

// ── Tools ─────────────────────────────────────────────────────────────────────

pub(super) async fn run_tool<T: Tool>(
    State(state): State<AppState>,
    body: Result<Json<T::Input>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(r) => return bad_body(r, T::KIND.failure_message()),
    };
    respond(state.request_timeout, StatusCode::OK, T::KIND.failure_message(), async {
        tools::run::<T>(&state.llm, &state.prompts, &input).await
    })
    .await
}

// ── Media ─────────────────────────────────────────────────────────────────────

pub(super) async fn media_image(
    State(state): State<AppState>,
    body: Result<Json<ImageRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(r) => return bad_body(r, IMAGE_FAILED),
    };
    respond(state.request_timeout, StatusCode::OK, IMAGE_FAILED, async {
        let media = media::generate_image(&state.llm, &req).await?;
        if let Some(t) = req.attach_to {
            state.notebooks.attach_media(t.notebook_id, t.message_id, media.clone())?;
        }
        Ok(media)
    })
    .await
}

pub(super) async fn media_speech(
    State(state): State<AppState>,
    body: Result<Json<SpeechRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(r) => return bad_body(r, SPEECH_FAILED),
    };
    respond(state.request_timeout, StatusCode::OK, SPEECH_FAILED, async {
        let media = media::narrate(&state.llm, &req).await?;
        if let Some(t) = req.attach_to {
            state.notebooks.attach_media(t.notebook_id, t.message_id, media.clone())?;
        }
        Ok(media)
    })
    .await
}

// ── Notebooks ─────────────────────────────────────────────────────────────────

pub(super) async fn create_notebook(State(state): State<AppState>) -> Response {
    match state.notebooks.create() {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => error_response(&e, "Failed to create notebook."),
    }
}

pub(super) async fn delete_notebook(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.request_timeout, StatusCode::NO_CONTENT, "Failed to delete notebook.", async {
        state.notebooks.delete(parse_id(&id, "notebook")?)
    })
    .await
}

pub(super) async fn list_sources(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.request_timeout, StatusCode::OK, "Failed to list sources.", async {
        state.notebooks.list_sources(parse_id(&id, "notebook")?)
    })
    .await
}

#[derive(Deserialize)]
pub(super) struct TextSourceBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    content: String,
}

pub(super) async fn add_text_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TextSourceBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(r) => return bad_body(r, UPLOAD_FAILED),
    };
    respond(state.request_timeout, StatusCode::CREATED, UPLOAD_FAILED, async {
        let id = parse_id(&id, "notebook")?;
        let source = text_source(&body.name, &body.content)?;
        state.notebooks.add_source(id, source)
    })
    .await
}

#[derive(Deserialize)]
pub(super) struct UploadBody {
    #[serde(default)]
    name: String,
    data_uri: String,
}

pub(super) async fn upload_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UploadBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(r) => return bad_body(r, UPLOAD_FAILED),
    };
    respond(state.request_timeout, StatusCode::CREATED, UPLOAD_FAILED, async {
        let id = parse_id(&id, "notebook")?;
        // Fail fast on an unknown notebook before paying for extraction.
        state.notebooks.list_sources(id)?;
        let source = state
            .ingestor
            .ingest(&state.llm, &state.prompts, &body.name, &body.data_uri)
            .await?;
        state.notebooks.add_source(id, source)
    })
    .await
}

pub(super) async fn toggle_source(
    State(state): State<AppState>,
    Path((id, source_id)): Path<(String, String)>,
) -> Response {
    respond(state.request_timeout, StatusCode::OK, "Failed to update source.", async {
        let source_id = parse_id(&source_id, "source")?;
        let selected = state.notebooks.toggle_source(parse_id(&id, "notebook")?, source_id)?;
        Ok(json!({ "id": source_id, "is_selected": selected }))
    })
    .await
}

pub(super) async fn remove_source(
    State(state): State<AppState>,
    Path((id, source_id)): Path<(String, String)>,
) -> Response {
    respond(state.request_timeout, StatusCode::NO_CONTENT, "Failed to remove source.", async {
        state
            .notebooks
            .remove_source(parse_id(&id, "notebook")?, parse_id(&source_id, "source")?)
    })
    .await
}

pub(super) async fn messages(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.request_timeout, StatusCode::OK, CHAT_FAILED, async {
        state.notebooks.history(parse_id(&id, "notebook")?)
    })
    .await
}

pub(super) async fn clear_messages(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.request_timeout, StatusCode::NO_CONTENT, CHAT_FAILED, async {
        state.notebooks.clear_history(parse_id(&id, "notebook")?)
    })
    .await
}

#[derive(Deserialize)]
pub(super) struct ChatBody {
    #[serde(default)]
    question: String,
}

pub(super) async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(r) => return bad_body(r, CHAT_FAILED),
    };
    respond(state.request_timeout, StatusCode::OK, CHAT_FAILED, async {
        let id = parse_id(&id, "notebook")?;
        state.notebooks.ask(id, &body.question, &state.llm, &state.prompts).await
    })
    .await
}
