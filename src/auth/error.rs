// Authentication and authorization error types

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::token::TokenRejection;

/// Authentication and authorization error types
#[derive(Debug, Error)]
pub enum AuthError {
    // Request errors
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Email already exists")]
    EmailAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid or expired code")]
    InvalidOrExpiredOtp,

    // Authentication errors
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Missing credential")]
    MissingToken,
    #[error("Invalid credential")]
    InvalidToken,
    #[error("Credential expired")]
    ExpiredToken,
    /// The token was valid but its account no longer exists
    #[error("Identity not found")]
    IdentityNotFound,

    // Authorization errors
    /// The requester is known but not entitled to the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Internal errors
    /// The reset code was stored but the email carrying it was not delivered
    #[error("OTP issued but delivery failed")]
    OtpDeliveryFailed,
    /// The reset code was stored but no mail transport is configured
    #[error("OTP issued but email is not configured")]
    OtpDeliveryUnavailable,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Password hashing error")]
    PasswordHashError,
    #[error("Token generation error: {0}")]
    TokenGenerationError(String),
}

impl From<TokenRejection> for AuthError {
    fn from(rejection: TokenRejection) -> Self {
        match rejection {
            TokenRejection::Malformed => AuthError::InvalidToken,
            TokenRejection::Expired => AuthError::ExpiredToken,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors.to_string())
    }
}

/// Malformed bodies and unknown fields are validation failures
impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::DatabaseError(msg) => error!("Database error in auth: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            AuthError::OtpDeliveryFailed => error!("Reset code stored but not delivered"),
            AuthError::OtpDeliveryUnavailable => {
                error!("Reset code stored but no mail transport is configured")
            }
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::IdentityNotFound
            | AuthError::InvalidCredentials => warn!("Authentication rejected: {}", self),
            AuthError::Forbidden(msg) => warn!("Authorization failed: {}", msg),
            _ => debug!("Auth request rejected: {}", self),
        }

        let body = Json(json!({
            "error_code": self.error_code(),
            "error": self.error_message(),
        }));

        (self.status_code(), body).into_response()
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidOrExpiredOtp => StatusCode::BAD_REQUEST,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::IdentityNotFound => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::OtpDeliveryFailed => StatusCode::BAD_GATEWAY,
            AuthError::OtpDeliveryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ValidationError(_) => "VALIDATION_ERROR",
            AuthError::InvalidOrExpiredOtp => "INVALID_OTP",
            AuthError::EmailAlreadyExists => "CONFLICT",
            AuthError::UserNotFound => "NOT_FOUND",
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::IdentityNotFound => "UNAUTHORIZED",
            AuthError::Forbidden(_) => "FORBIDDEN",
            AuthError::OtpDeliveryFailed => "DELIVERY_FAILED",
            AuthError::OtpDeliveryUnavailable => "DELIVERY_UNAVAILABLE",
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(msg) => msg.clone(),
            AuthError::Forbidden(msg) => msg.clone(),
            AuthError::OtpDeliveryFailed => {
                "Reset code issued but the email could not be delivered".to_string()
            }
            AuthError::OtpDeliveryUnavailable => {
                "Reset code issued but email delivery is not configured".to_string()
            }
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}
