/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Errors render as the dashboard's
/// error envelope:
///
/// ```json
/// {
///   "success": false,
///   "code": 400,
///   "error": "INVALID_REQUEST",
///   "message": "Key and value are required"
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mythicaldash_shared::{
    auth::{authorization::AuthzError, session::SessionError},
    error::StoreError,
    integrations::IntegrationError,
    services::{leaderboard::LeaderboardError, settings::SettingsError},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    InvalidRequest(String),

    /// No valid session, or the session lacks a capability (401)
    InvalidSession(String),

    /// Unknown leaderboard type (400)
    InvalidType(String),

    /// Leaderboard switched off in settings (400)
    LeaderboardDisabled,

    /// Not found (404)
    NotFound(String),

    /// Third-party service answered with an error (502)
    Upstream(String),

    /// Storage or third-party service unreachable (500)
    ServiceUnavailable(String),

    /// Internal server error (500)
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: u16,
    pub error: String,
    pub message: String,
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::InvalidSession(_) => (StatusCode::UNAUTHORIZED, "INVALID_SESSION"),
            ApiError::InvalidType(_) => (StatusCode::BAD_REQUEST, "INVALID_TYPE"),
            ApiError::LeaderboardDisabled => (StatusCode::BAD_REQUEST, "LEADERBOARD_DISABLED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERVICE_UNAVAILABLE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::InvalidSession(msg) => write!(f, "Invalid session: {}", msg),
            ApiError::InvalidType(kind) => write!(f, "Invalid leaderboard type: {}", kind),
            ApiError::LeaderboardDisabled => write!(f, "Leaderboard is disabled"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            ApiError::Internal(msg) | ApiError::ServiceUnavailable(msg) => {
                // Log the cause but don't expose details to clients
                tracing::error!(error = %msg, code, "Request failed");
                "The service is temporarily unavailable".to_string()
            }
            ApiError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream service error");
                "An upstream service returned an error".to_string()
            }
            ApiError::LeaderboardDisabled => "The leaderboard is disabled".to_string(),
            ApiError::InvalidType(kind) => format!("Unknown leaderboard type: {}", kind),
            ApiError::InvalidRequest(msg) | ApiError::InvalidSession(msg) | ApiError::NotFound(msg) => msg,
        };

        let body = Json(ErrorResponse {
            success: false,
            code: status.as_u16(),
            error: code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<AuthzError> for ApiError {
    fn from(_: AuthzError) -> Self {
        ApiError::InvalidSession("You are not allowed to do this".to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingToken | SessionError::InvalidToken => {
                ApiError::InvalidSession("Invalid or missing session".to_string())
            }
            SessionError::Banned => ApiError::InvalidSession("Account is banned".to_string()),
            SessionError::Store(e) => e.into(),
        }
    }
}

impl From<IntegrationError> for ApiError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::Status { status: 404, .. } => {
                ApiError::NotFound("Resource not found".to_string())
            }
            IntegrationError::Transport(e) => ApiError::ServiceUnavailable(e.to_string()),
            IntegrationError::NotConfigured(what) => {
                ApiError::ServiceUnavailable(format!("{} is not configured", what))
            }
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            SettingsError::Unauthorized(e) => e.into(),
            SettingsError::Unavailable(e) => e.into(),
        }
    }
}

impl From<LeaderboardError> for ApiError {
    fn from(err: LeaderboardError) -> Self {
        match err {
            LeaderboardError::InvalidType(kind) => ApiError::InvalidType(kind),
            LeaderboardError::Disabled => ApiError::LeaderboardDisabled,
            LeaderboardError::Unauthorized(e) => e.into(),
            LeaderboardError::Store(e) => e.into(),
        }
    }
}
