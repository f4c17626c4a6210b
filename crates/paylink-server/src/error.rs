use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use paylink::{LinkError, ResolveError, ServiceError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Form fields failed validation
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Link could not be decoded
    #[error(transparent)]
    InvalidLink(#[from] LinkError),

    /// Malformed request body or parameters
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Tracked request does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// ENS name has no address
    #[error("unknown name: {0}")]
    UnknownName(String),

    /// No external-service key configured
    #[error("payment service is not configured")]
    NotConfigured,

    /// External service failed
    #[error("upstream error: {0}")]
    Upstream(ServiceError),
}

impl From<ValidationErrors> for ServerError {
    fn from(e: ValidationErrors) -> Self {
        ServerError::Validation(e)
    }
}

impl From<ServiceError> for ServerError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(what) => ServerError::NotFound(what),
            ServiceError::NotConfigured => ServerError::NotConfigured,
            ServiceError::InvalidRequest(msg) => ServerError::BadRequest(msg),
            other => ServerError::Upstream(other),
        }
    }
}

impl From<ResolveError> for ServerError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::LoadFailed(inner) => inner.into(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::InvalidLink(_) | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotFound(_) | ServerError::UnknownName(_) => StatusCode::NOT_FOUND,
            ServerError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ServerError::Validation(errors) => serde_json::json!({
                "error": "validation_failed",
                "message": errors.to_string(),
                "fields": errors,
            }),
            ServerError::InvalidLink(e) => serde_json::json!({
                "error": "invalid_link",
                "message": e.to_string(),
            }),
            ServerError::BadRequest(msg) => serde_json::json!({
                "error": "bad_request",
                "message": msg,
            }),
            ServerError::NotFound(_) => serde_json::json!({
                "error": "not_found",
                "message": "Payment request not found",
            }),
            ServerError::UnknownName(name) => serde_json::json!({
                "error": "unknown_name",
                "message": format!("No address is set for {name}"),
            }),
            ServerError::NotConfigured => serde_json::json!({
                "error": "not_configured",
                "message": "Tracked payment requests are not available on this server",
            }),
            ServerError::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                serde_json::json!({
                    "error": "upstream_error",
                    "message": "Failed to reach the payment service",
                })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
