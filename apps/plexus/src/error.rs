use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use plexus_common::AliasId;
use plexus_provider::ProviderError;
use plexus_router::RouterError;
use serde_json::json;

/// The OpenAI-shaped `{"error": {...}}` envelope every client-facing
/// endpoint returns on failure, regardless of which wire format the request
/// came in on.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_type: &'static str,
    pub code: Option<&'static str>,
    pub message: String,
    pub retry_after_seconds: Option<u64>,
}

impl ApiError {
    fn new(status: StatusCode, error_type: &'static str, message: impl Into<String>) -> Self {
        Self { status, error_type, code: None, message: message.into(), retry_after_seconds: None }
    }

    fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request_error", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "auth_error", message)
    }

    pub fn from_router_error(err: RouterError) -> Self {
        match err {
            RouterError::ModelNotFound(alias) => {
                Self::new(StatusCode::NOT_FOUND, "invalid_request_error", format!("model not found: {alias}"))
                    .with_code("model_not_found")
            }
            RouterError::AllProvidersCooledDown { alias, retry_after_seconds } => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error_type: "server_error",
                code: Some("all_providers_cooled_down"),
                message: format!("all providers for {alias} are on cooldown"),
                retry_after_seconds: Some(retry_after_seconds),
            },
            RouterError::QuotaExhausted(alias) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                format!("quota exhausted for {alias}"),
            )
            .with_code("quota_exhausted"),
            RouterError::UnimplementedSelector(name) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                format!("selector '{name}' is not implemented"),
            )
            .with_code("unimplemented_selector"),
        }
    }

    pub fn from_provider_error(err: ProviderError) -> Self {
        match err {
            ProviderError::Http { status, message, retry_after } => {
                let code = http_status_code(status);
                let error_type = match status {
                    401 | 403 => "auth_error",
                    408 => "timeout",
                    429 => "rate_limit_error",
                    500..=599 => "server_error",
                    _ => "invalid_request_error",
                };
                Self {
                    status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    error_type,
                    code,
                    message,
                    retry_after_seconds: retry_after.map(|d| d.as_secs()),
                }
            }
            ProviderError::Transport(message) => {
                Self::new(StatusCode::BAD_GATEWAY, "connection_error", message).with_code("connection_error")
            }
            ProviderError::Decode(message) => {
                Self::new(StatusCode::BAD_GATEWAY, "server_error", message).with_code("server_error")
            }
        }
    }

    pub fn model_not_found(alias: &AliasId) -> Self {
        Self::from_router_error(RouterError::ModelNotFound(alias.clone()))
    }
}

fn http_status_code(status: u16) -> Option<&'static str> {
    match status {
        401 | 403 => Some("auth_error"),
        408 => Some("timeout"),
        429 => Some("rate_limit_error"),
        500..=599 => Some("server_error"),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": {
                "message": self.message,
                "type": self.error_type,
            }
        });
        if let Some(code) = self.code {
            body["error"]["code"] = json!(code);
        }

        let mut response = (self.status, Json(body)).into_response();
        if let Some(seconds) = self.retry_after_seconds {
            if let Ok(value) = axum::http::HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}
