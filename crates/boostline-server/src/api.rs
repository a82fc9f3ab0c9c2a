use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use boostline_core::Submission;
use boostline_pipeline::SubmissionPipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};
use crate::scheduler::RefreshRunner;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SubmissionPipeline>,
    pub refresh: Arc<RefreshRunner>,
    pub intake: Arc<IntakeFilter>,
}

/// Decides which relayed chat messages count as submissions.
#[derive(Debug, Clone)]
pub struct IntakeFilter {
    pub channel_id: String,
    pub ignored_authors: Vec<String>,
}

impl IntakeFilter {
    /// `Err` carries the reason a message is dropped.
    fn admit(&self, message: &RelayMessage) -> Result<(), &'static str> {
        if message.channel_id != self.channel_id {
            return Err("other_channel");
        }
        if message.author_is_bot {
            return Err("bot_author");
        }
        if self.ignored_authors.iter().any(|a| a == &message.author) {
            return Err("ignored_author");
        }
        Ok(())
    }
}

/// One inbound chat message as delivered by the chat relay.
#[derive(Debug, Deserialize)]
pub struct RelayMessage {
    pub id: String,
    pub channel_id: String,
    pub author: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct AckData {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/submissions", post(submit))
        .route("/api/v1/refresh", post(trigger_refresh))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}

async fn submit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(message): Json<RelayMessage>,
) -> Result<impl IntoResponse, ApiError> {
    if message.id.trim().is_empty() || message.content.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "id and content must not be empty",
        ));
    }

    if let Err(reason) = state.intake.admit(&message) {
        tracing::debug!(message_id = %message.id, reason, "relay message ignored");
        return Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: AckData {
                    status: "ignored",
                    reason: Some(reason),
                },
                meta: ResponseMeta::new(req_id.0),
            }),
        ));
    }

    let submission = Submission::capture(
        message.id,
        message.channel_id,
        message.author,
        &message.content,
        message.timestamp.unwrap_or_else(Utc::now),
    );
    tracing::info!(
        message_id = %submission.id,
        author = %submission.submitter_handle,
        "submission queued"
    );

    let pipeline = Arc::clone(&state.pipeline);
    tokio::spawn(async move {
        pipeline.handle(&submission).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: AckData {
                status: "queued",
                reason: None,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

async fn trigger_refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.refresh.spawn("manual") {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "a refresh run is already in progress",
        ));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: AckData {
                status: "started",
                reason: None,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
