use crate::query_payload::{HealthResponse, QueryPayload};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use nirmai_qa::{AnswerResponse, CorpusState, ErrorResponse, QueryError, QueryService};
use std::path::PathBuf;
use std::sync::Arc;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub query_service: Arc<QueryService>,
    pub documents: Arc<Vec<PathBuf>>,
    pub verbose: bool,
}

pub enum ApiError {
    MethodNotAllowed,
    MissingQuery,
    Query(QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
            ApiError::MissingQuery => (StatusCode::BAD_REQUEST, "No query provided"),
            ApiError::Query(QueryError::NotReady) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PDF content is not loaded yet.")
            }
            ApiError::Query(QueryError::LoadFailed(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load PDFs")
            }
            ApiError::Query(QueryError::Upstream(_) | QueryError::Internal(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing your query.",
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route(
            "/api/query",
            any(handle_query).layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Takes the raw request so the method is checked before any body is read.
pub async fn handle_query(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<AnswerResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    if state.verbose {
        log::info!("[{}] API /api/query called ({})", request_id, request.method());
    }

    if *request.method() != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let body = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            log::warn!("[{}] Failed to read request body: {}", request_id, e);
            return Err(ApiError::MissingQuery);
        }
    };

    let query = match QueryPayload::query_from_body(&body) {
        Some(query) => query,
        None => {
            if state.verbose {
                log::info!("[{}] No query provided", request_id);
            }
            return Err(ApiError::MissingQuery);
        }
    };

    let answer = state
        .query_service
        .answer(&request_id, &query)
        .await
        .map_err(ApiError::Query)?;

    log::info!("[{}] Answered query ({} chars)", request_id, answer.len());
    Ok(Json(AnswerResponse { answer }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.query_service.corpus().snapshot().await;
    let corpus_length = match &snapshot {
        CorpusState::Ready(text) => Some(text.len()),
        _ => None,
    };

    Json(HealthResponse {
        status: "ok",
        corpus: snapshot.label(),
        corpus_length,
        documents: state
            .documents
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    })
}
