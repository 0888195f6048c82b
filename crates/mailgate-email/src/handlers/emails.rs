//! Mail sending handlers

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mailgate_core::{
    error_builder::{
        bad_gateway, bad_request, internal_server_error, with_status, PROBLEM_BASE_URL,
    },
    problemdetails::Problem,
};
use tracing::{debug, error, info};
use utoipa::OpenApi;

use super::types::{AppState, HealthResponse, SendEmailForm, SendEmailResponseBody};
use crate::errors::EmailError;
use crate::models::{Attachment, Message};

const PARAMS_FIELD: &str = "email_params";
const QUEUED_MESSAGE: &str = "Successfully Queued.";

/// Configure mail routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/emails", post(send_email))
        .route("/health", get(health))
}

impl From<EmailError> for Problem {
    fn from(err: EmailError) -> Self {
        let builder = match err.status() {
            StatusCode::BAD_REQUEST => bad_request(),
            StatusCode::INTERNAL_SERVER_ERROR => internal_server_error(),
            status if status.is_client_error() || status.is_server_error() => {
                with_status(status)
            }
            _ => bad_gateway(),
        };
        let slug = err.error_code().to_lowercase().replace('_', "-");

        builder
            .type_(format!("{}/{}", PROBLEM_BASE_URL, slug))
            .title(err.classification().title())
            .detail(err.to_string())
            .value("error_code", err.error_code())
            .value("classification", err.classification())
            .instance("/emails")
            .build()
    }
}

/// Send a message through the configured providers
#[utoipa::path(
    tag = "Emails",
    post,
    path = "/emails",
    request_body(content = SendEmailForm, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Message accepted by a provider", body = SendEmailResponseBody),
        (status = 400, description = "Invalid message", body = mailgate_core::ProblemDetails),
        (status = 401, description = "Provider rejected the credentials", body = mailgate_core::ProblemDetails),
        (status = 500, description = "Every provider failed or the request could not be read", body = mailgate_core::ProblemDetails),
        (status = 503, description = "No provider could be reached", body = mailgate_core::ProblemDetails)
    )
)]
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, Problem> {
    let mut multipart = multipart.map_err(|e| {
        error!("Request is not a readable multipart form: {}", e);
        EmailError::MissingParams
    })?;

    let mut params: Option<String> = None;
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_failure(&state, e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            PARAMS_FIELD => {
                let text = field.text().await.map_err(|e| read_failure(&state, e))?;
                params = Some(text);
            }
            "attachments" | "attachment" => {
                attachments.push(read_attachment(&state, field).await?);
            }
            other => debug!("Ignoring unexpected form field {:?}", other),
        }
    }

    let message = parse_params(params.as_deref())?;

    let receipt = state
        .dispatch_service
        .send(&message, &attachments)
        .await?;

    info!(
        "Queued message through {} after {} attempt(s)",
        receipt.provider, receipt.attempts
    );

    let response = SendEmailResponseBody {
        status: StatusCode::ACCEPTED.as_u16(),
        message: QUEUED_MESSAGE.to_string(),
        provider: receipt.provider.to_string(),
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Gateway liveness and provider count
#[utoipa::path(
    tag = "Health",
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        providers: state.dispatch_service.providers().len(),
    })
}

pub async fn openapi() -> impl IntoResponse {
    Json(super::EmailApiDoc::openapi())
}

fn parse_params(params: Option<&str>) -> Result<Message, EmailError> {
    let params = params
        .filter(|p| !p.trim().is_empty())
        .ok_or(EmailError::MissingParams)?;

    serde_json::from_str(params).map_err(|e| {
        error!("Email parameters are not valid JSON: {}", e);
        EmailError::InvalidParams
    })
}

async fn read_attachment(state: &AppState, field: Field<'_>) -> Result<Attachment, EmailError> {
    let filename = field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or("attachment")
        .to_string();
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    let bytes = field.bytes().await.map_err(|e| read_failure(state, e))?;
    Ok(Attachment::from_bytes(filename, content_type, bytes))
}

fn read_failure(state: &AppState, err: MultipartError) -> EmailError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        error!("Request body is larger than {} bytes", state.max_body_bytes());
        return EmailError::MailSizeExceeded {
            limit: state.limits.max_mail_size,
        };
    }

    error!("Failed to read multipart form: {}", err);
    EmailError::ParamsReadFailure
}
