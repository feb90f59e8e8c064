// Identity service - business logic layer

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        LoginRequest, LoginResponse, NewUser, Role, SignupRequest, SignupResponse,
        UpdateUserRequest, UserChanges, UserResponse,
    },
    password::PasswordService,
    policy,
    repository::UserStore,
    token::{TokenService, LOGIN_TOKEN_TTL, SIGNUP_TOKEN_TTL},
};
use crate::config::AdminSeed;
use crate::notify::{Dispatcher, Mail};
use crate::validation::normalize_email;

/// Identity service coordinating account operations
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    dispatcher: Dispatcher,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>, dispatcher: Dispatcher) -> Self {
        Self {
            users,
            tokens,
            dispatcher,
        }
    }

    /// Register a new account and return it with a 7-day token
    ///
    /// The role defaults to `user`; `admin` cannot be chosen here.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupResponse, AuthError> {
        request.validate()?;
        PasswordService::validate_password_strength(&request.password)?;

        let role = request.role.unwrap_or(Role::User);
        if role == Role::Admin {
            return Err(AuthError::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_blocking(request.password).await?;
        let user = self
            .users
            .insert(NewUser {
                username: request.username.trim().to_string(),
                phone: request.phone,
                email: normalize_email(&request.email),
                password_hash,
                role,
            })
            .await?;

        let token = self.tokens.issue(user.id, user.role, SIGNUP_TOKEN_TTL)?;
        info!("User registered: user_id={}, role={}", user.id, user.role);

        self.dispatcher.dispatch(Mail::welcome(&user.email, &user.username));

        Ok(SignupResponse {
            message: "User registered successfully".to_string(),
            data: user.into(),
            token,
        })
    }

    /// Check the password and return a 1-day token
    ///
    /// Unknown email and wrong password fail the same way and cost the same
    /// hashing work.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        request.validate()?;

        let Some(user) = self
            .users
            .find_by_email(&normalize_email(&request.email))
            .await?
        else {
            PasswordService::verify_decoy_blocking(request.password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let matches =
            PasswordService::verify_blocking(request.password, user.password_hash.clone()).await?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, user.role, LOGIN_TOKEN_TTL)?;
        info!("User logged in: user_id={}", user.id);

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user_id: user.id,
            role: user.role,
        })
    }

    /// Create the configured admin account unless its email is already taken
    pub async fn bootstrap_admin(&self, seed: &AdminSeed) -> Result<Option<UserResponse>, AuthError> {
        let email = normalize_email(&seed.email);
        if self.users.find_by_email(&email).await?.is_some() {
            info!("Admin account already present");
            return Ok(None);
        }

        PasswordService::validate_password_strength(&seed.password)?;
        let password_hash = PasswordService::hash_blocking(seed.password.clone()).await?;
        let admin = self
            .users
            .insert(NewUser {
                username: seed.username.clone(),
                phone: seed.phone.clone(),
                email,
                password_hash,
                role: Role::Admin,
            })
            .await?;

        info!("Admin account created: user_id={}", admin.id);
        Ok(Some(admin.into()))
    }

    pub async fn get_user(&self, actor: &AuthenticatedUser, id: i32) -> Result<UserResponse, AuthError> {
        policy::ensure_self_or_admin(actor, id)?;

        self.users
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Every account; callers restrict this to admins
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        let users = self.users.list_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Apply a partial update; a new password is re-hashed
    pub async fn update_user(
        &self,
        actor: &AuthenticatedUser,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        request.validate()?;
        policy::ensure_self_or_admin(actor, id)?;

        let password_hash = match request.password {
            Some(password) => {
                PasswordService::validate_password_strength(&password)?;
                Some(PasswordService::hash_blocking(password).await?)
            }
            None => None,
        };

        let changes = UserChanges {
            username: request.username.map(|name| name.trim().to_string()),
            phone: request.phone,
            email: request.email.as_deref().map(normalize_email),
            password_hash,
        };

        let user = self
            .users
            .update_fields(id, changes)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        info!("User updated: user_id={} by actor={}", user.id, actor.user_id);
        Ok(user.into())
    }

    /// Delete an account; its shops and items go with it
    pub async fn delete_user(&self, actor: &AuthenticatedUser, id: i32) -> Result<(), AuthError> {
        policy::ensure_self_or_admin(actor, id)?;

        if !self.users.delete(id).await? {
            return Err(AuthError::UserNotFound);
        }

        info!("User deleted: user_id={} by actor={}", id, actor.user_id);
        Ok(())
    }
}
