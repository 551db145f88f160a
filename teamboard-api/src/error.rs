/// Error handling for the API server
///
/// Every handler returns [`ApiResult`]. Errors render as
/// `{"success": false, "error": "<message>"}` with the matching status code.
///
/// # Example
///
/// ```
/// use teamboard_api::error::{ApiError, ApiResult};
///
/// fn lookup(found: bool) -> ApiResult<&'static str> {
///     if !found {
///         return Err(ApiError::NotFound("Board not found".to_string()));
///     }
///     Ok("board")
/// }
///
/// assert!(lookup(false).is_err());
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use teamboard_shared::auth::jwt::JwtError;
use teamboard_shared::auth::middleware::AuthError;
use teamboard_shared::services::ServiceError;
use teamboard_shared::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed input or a violated domain rule (400)
    BadRequest(String),

    /// Missing or invalid credentials (401)
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Missing resource (404)
    NotFound(String),

    /// Anything the client cannot fix (500); the detail is logged only
    InternalError(String),
}

/// Failure envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => msg,
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
        });

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Rule(msg) | ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::Store(err) => err.into(),
            ServiceError::Password(err) => {
                ApiError::InternalError(format!("Password operation failed: {}", err))
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            StoreError::UniqueViolation(constraint) => {
                ApiError::BadRequest(format!("Constraint violation: {}", constraint))
            }
            StoreError::Persistence(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(err) => err.into(),
            other => {
                tracing::debug!(reason = %other, "Rejected unauthenticated request");
                ApiError::Unauthorized("Unauthorized".to_string())
            }
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            other => ApiError::Unauthorized(format!("Invalid token: {}", other)),
        }
    }
}

/// Reports the first failing field, in field-name order
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .flat_map(|(_, errors)| errors.iter())
            .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid request".to_string());

        ApiError::BadRequest(message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
        name: String,
        #[validate(email(message = "Invalid email address"))]
        email: String,
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Team not found".to_string());
        assert_eq!(err.to_string(), "Not found: Team not found");
    }

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Rule("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Store(StoreError::NotFound), StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_persistence_error_is_internal() {
        let err: ApiError = StoreError::persistence(std::io::Error::other("connection reset")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_errors_are_generic() {
        let err: ApiError = AuthError::MissingCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Unauthorized"));

        let err: ApiError = AuthError::InvalidToken(JwtError::Expired).into();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Unauthorized"));
    }

    #[test]
    fn test_validation_reports_first_field() {
        let signup = Signup {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
        };
        let err: ApiError = signup.validate().unwrap_err().into();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Invalid email address"));
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::Forbidden("Forbidden: nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Forbidden: nope");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::InternalError("pool timed out".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }
}
