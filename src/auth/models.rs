// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{validate_not_blank, validate_otp_code, validate_phone};

/// Account role, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(rename = "shop")]
    #[sqlx(rename = "shop")]
    ShopOwner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::ShopOwner => "shop",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A password-reset code bound to an account until `expires_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingOtp {
    /// True when `code` matches and `now` has not passed the expiry
    pub fn accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.code == code && now <= self.expires_at
    }
}

/// User domain model
///
/// The OTP code and its expiry travel together, so an account either has a
/// pending reset or it does not.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub otp: Option<PendingOtp>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `users` table
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i32,
    pub username: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub reset_otp: Option<String>,
    pub reset_otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let otp = match (row.reset_otp, row.reset_otp_expires_at) {
            (Some(code), Some(expires_at)) => Some(PendingOtp { code, expires_at }),
            _ => None,
        };

        Self {
            id: row.id,
            username: row.username,
            phone: row.phone,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            otp,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// User response model (excludes password_hash and OTP state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub phone: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            phone: user.phone,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Insert payload for the credential store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Field changes for an existing account, assembled by the service
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Signup request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub username: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    pub role: Option<Role>,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Partial account update; the role is deliberately not updatable
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub username: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
}

/// Forgot-password request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

/// OTP verification request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom = "validate_otp_code")]
    pub otp: String,
}

/// Password reset request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom = "validate_otp_code")]
    pub otp: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Signup response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    pub data: UserResponse,
    pub token: String,
}

/// Login response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: i32,
    pub role: Role,
}

/// Single-user envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub message: String,
    pub data: UserResponse,
}

/// User list envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListEnvelope {
    pub message: String,
    pub total: usize,
    pub data: Vec<UserResponse>,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Echo of the authenticated identity
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthVerifyResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(code: Option<&str>, expires_at: Option<DateTime<Utc>>) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: 1,
            username: "asha".to_string(),
            phone: "9876543210".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::ShopOwner,
            reset_otp: code.map(str::to_string),
            reset_otp_expires_at: expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_with_both_otp_columns_has_pending_otp() {
        let expires_at = Utc::now() + Duration::minutes(10);
        let user = User::from(row(Some("123456"), Some(expires_at)));
        assert_eq!(
            user.otp,
            Some(PendingOtp { code: "123456".to_string(), expires_at })
        );
    }

    #[test]
    fn test_row_with_half_otp_state_has_none() {
        assert!(User::from(row(Some("123456"), None)).otp.is_none());
        assert!(User::from(row(None, Some(Utc::now()))).otp.is_none());
    }

    #[test]
    fn test_pending_otp_expiry_boundary() {
        let now = Utc::now();
        let otp = PendingOtp { code: "654321".to_string(), expires_at: now };
        assert!(otp.accepts("654321", now));
        assert!(!otp.accepts("654321", now + Duration::milliseconds(1)));
        assert!(!otp.accepts("123456", now - Duration::minutes(1)));
    }

    #[test]
    fn test_user_response_strips_secrets() {
        let user = User::from(row(Some("123456"), Some(Utc::now())));
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("otp").is_none());
        assert_eq!(json["role"], "shop");
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::ShopOwner).unwrap(), "\"shop\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }
}
