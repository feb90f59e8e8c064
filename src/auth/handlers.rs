// HTTP handlers for account endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::{AdminUser, AuthenticatedUser},
    models::{
        AuthVerifyResponse, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
        ResetPasswordRequest, SignupRequest, SignupResponse, UpdateUserRequest, UserEnvelope,
        UserListEnvelope, VerifyOtpRequest,
    },
};
use crate::notify::Delivery;
use crate::AppState;

/// Handler for POST /user/signup
#[utoipa::path(
    post,
    path = "/user/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin role requested"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users"
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), AuthError> {
    let Json(request) = payload?;
    let response = state.auth_service.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /user/login
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(request) = payload?;
    Ok(Json(state.auth_service.login(request).await?))
}

/// Handler for PUT /user/updateuser/:id
#[utoipa::path(
    put,
    path = "/user/updateuser/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserEnvelope),
        (status = 400, description = "Invalid input or unknown field"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, AuthError> {
    let Json(request) = payload?;
    let user = state.auth_service.update_user(&actor, id, request).await?;
    Ok(Json(UserEnvelope {
        message: "User updated successfully".to_string(),
        data: user,
    }))
}

/// Handler for GET /user/getuser/:id
#[utoipa::path(
    get,
    path = "/user/getuser/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "The account", body = UserEnvelope),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<UserEnvelope>, AuthError> {
    let user = state.auth_service.get_user(&actor, id).await?;
    Ok(Json(UserEnvelope {
        message: "User fetched successfully".to_string(),
        data: user,
    }))
}

/// Handler for GET /user/getalluser (admin only)
#[utoipa::path(
    get,
    path = "/user/getalluser",
    responses(
        (status = 200, description = "All accounts", body = UserListEnvelope),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_all_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<UserListEnvelope>, AuthError> {
    debug!("Listing users for admin user_id={}", admin.user_id);
    let users = state.auth_service.list_users().await?;
    Ok(Json(UserListEnvelope {
        message: "Users fetched successfully".to_string(),
        total: users.len(),
        data: users,
    }))
}

/// Handler for DELETE /user/deleteuser/:id
#[utoipa::path(
    delete,
    path = "/user/deleteuser/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.auth_service.delete_user(&actor, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Handler for POST /user/forgot-password
///
/// Answers 502 when the code was stored but the email did not go out, and 503
/// when no mail transport is configured.
#[utoipa::path(
    post,
    path = "/user/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset code sent", body = MessageResponse),
        (status = 404, description = "User not found"),
        (status = 502, description = "Reset code issued but not delivered"),
        (status = 503, description = "Reset code issued but email is not configured")
    ),
    tag = "users"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Json(request) = payload?;
    request.validate()?;

    let issued = state.otp_service.request_reset(&request.email).await?;
    match issued.delivery {
        Delivery::Sent => Ok(Json(MessageResponse::new("OTP sent to your email"))),
        Delivery::Failed => Err(AuthError::OtpDeliveryFailed),
        Delivery::Skipped => Err(AuthError::OtpDeliveryUnavailable),
    }
}

/// Handler for POST /user/verify-otp
#[utoipa::path(
    post,
    path = "/user/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code is valid", body = MessageResponse),
        (status = 400, description = "Invalid or expired code")
    ),
    tag = "users"
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Json(request) = payload?;
    request.validate()?;

    state.otp_service.verify(&request.email, &request.otp).await?;
    Ok(Json(MessageResponse::new("OTP verified successfully")))
}

/// Handler for POST /user/reset-password
#[utoipa::path(
    post,
    path = "/user/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Invalid or expired code")
    ),
    tag = "users"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Json(request) = payload?;
    request.validate()?;

    state
        .otp_service
        .reset_password(&request.email, &request.otp, &request.password)
        .await?;
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

/// Handler for GET /user/verify-auth
#[utoipa::path(
    get,
    path = "/user/verify-auth",
    responses(
        (status = 200, description = "The authenticated identity", body = AuthVerifyResponse),
        (status = 401, description = "Missing, invalid or expired credential")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn verify_auth(actor: AuthenticatedUser) -> Json<AuthVerifyResponse> {
    Json(AuthVerifyResponse {
        success: true,
        message: "Authenticated".to_string(),
        user: actor.user,
    })
}
