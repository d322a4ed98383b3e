use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use anzsic_domain::{ClassifyRequest, ClassifyResponse, SearchMode, ValidationError};
use anzsic_service::Error;

/// Body of `POST /v1/classify`. Omitted fields fall back to the configured defaults.
#[derive(Debug, Deserialize)]
pub struct ClassifyPayload {
	pub query: String,
	#[serde(default)]
	pub mode: Option<String>,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub retrieval_n: Option<u32>,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/classify", post(classify))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn classify(
	State(state): State<AppState>,
	payload: Result<Json<ClassifyPayload>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
	let Json(payload) = payload?;
	let mode = match payload.mode.as_deref() {
		Some(raw) => raw.parse::<SearchMode>()?,
		None => SearchMode::default(),
	};
	let request = ClassifyRequest::new(payload.query, mode)
		.with_top_k(payload.top_k.unwrap_or(state.defaults.top_k))
		.with_retrieval_n(payload.retrieval_n.unwrap_or(state.defaults.retrieval_n));
	let response = state.pipeline.classify(request).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { field, message } => ApiError::new(
				StatusCode::UNPROCESSABLE_ENTITY,
				"INVALID_REQUEST",
				message,
				field.map(|field| vec![format!("$.{field}")]),
			),
			Error::Authentication { message } => {
				tracing::error!(error = %message, "Provider authentication failed.");

				ApiError::new(StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED", message, None)
			},
			Error::Embedding { message } => {
				tracing::error!(error = %message, "Embedding provider failed.");

				ApiError::new(StatusCode::BAD_GATEWAY, "EMBEDDING_FAILED", message, None)
			},
			Error::Llm { message } => {
				tracing::error!(error = %message, "LLM provider failed.");

				ApiError::new(StatusCode::BAD_GATEWAY, "LLM_FAILED", message, None)
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage failed.");

				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", message, None)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		ApiError::new(rejection.status(), "INVALID_REQUEST", rejection.body_text(), None)
	}
}

impl From<ValidationError> for ApiError {
	fn from(err: ValidationError) -> Self {
		Error::from(err).into()
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
