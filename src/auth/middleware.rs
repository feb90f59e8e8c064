// Authentication extractors for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::{Role, UserResponse},
    policy,
    repository::UserStore,
    token::TokenService,
};

/// What the extractors need from the application state
#[derive(Clone)]
pub struct AuthContext {
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserStore>,
}

impl AuthContext {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }
}

/// Authenticated identity attached to a request
///
/// `role` comes from the stored account, not from the token, so a role
/// change or deletion takes effect on the next request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub role: Role,
    pub user: UserResponse,
}

/// Pull the token out of the Authorization header
///
/// Accepts `Bearer <token>` (scheme in any case) or the bare token.
fn credential(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest,
        _ => value,
    }
    .trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AuthContext: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = AuthContext::from_ref(state);
        let endpoint = parts.uri.path().to_string();

        let token = credential(parts).map_err(|e| {
            warn!("Rejected request to {}: {}", endpoint, e);
            e
        })?;

        let claims = context.tokens.verify(token).map_err(AuthError::from)?;

        let user = context
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                warn!("Token subject {} no longer exists ({})", claims.sub, endpoint);
                AuthError::IdentityNotFound
            })?;

        debug!("Authenticated user_id={} role={} endpoint={}", user.id, user.role, endpoint);

        Ok(AuthenticatedUser {
            user_id: user.id,
            role: user.role,
            user: user.into(),
        })
    }
}

/// Authenticated identity whose stored role is admin
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AuthContext: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let actor = AuthenticatedUser::from_request_parts(parts, state).await?;
        policy::ensure_admin(&actor)?;
        Ok(AdminUser(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::NewUser;
    use crate::auth::token::LOGIN_TOKEN_TTL;
    use crate::memory::MemoryStore;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn parts_with_auth(auth_value: &str) -> Parts {
        let req = Request::builder()
            .uri("/user/verify-auth")
            .header(header::AUTHORIZATION, auth_value)
            .body(())
            .unwrap();
        req.into_parts().0
    }

    fn parts_without_auth() -> Parts {
        let req = Request::builder().uri("/user/verify-auth").body(()).unwrap();
        req.into_parts().0
    }

    async fn context_with_user(role: Role) -> (AuthContext, i32) {
        let store = MemoryStore::new();
        let user = UserStore::insert(
            &store,
            NewUser {
                username: "asha".to_string(),
                phone: "9876543210".to_string(),
                email: "asha@example.com".to_string(),
                password_hash: "$argon2id$stub".to_string(),
                role,
            },
        )
        .await
        .unwrap();

        let context = AuthContext::new(Arc::new(TokenService::new(SECRET)), Arc::new(store));
        (context, user.id)
    }

    #[tokio::test]
    async fn test_bearer_and_raw_tokens_are_accepted() {
        let (context, user_id) = context_with_user(Role::User).await;
        let token = context.tokens.issue(user_id, Role::User, LOGIN_TOKEN_TTL).unwrap();

        for value in [
            format!("Bearer {}", token),
            format!("bearer {}", token),
            format!("BEARER  {}", token),
            token.clone(),
        ] {
            let mut parts = parts_with_auth(&value);
            let actor = AuthenticatedUser::from_request_parts(&mut parts, &context)
                .await
                .unwrap();
            assert_eq!(actor.user_id, user_id);
            assert_eq!(actor.user.email, "asha@example.com");
        }
    }

    #[tokio::test]
    async fn test_missing_header_is_missing_token() {
        let (context, _) = context_with_user(Role::User).await;

        let mut parts = parts_without_auth();
        let result = AuthenticatedUser::from_request_parts(&mut parts, &context).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));

        let mut parts = parts_with_auth("Bearer ");
        let result = AuthenticatedUser::from_request_parts(&mut parts, &context).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (context, user_id) = context_with_user(Role::User).await;
        let issued = Utc::now() - Duration::days(2);
        let token = context
            .tokens
            .issue_at(user_id, Role::User, LOGIN_TOKEN_TTL, issued)
            .unwrap();

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let result = AuthenticatedUser::from_request_parts(&mut parts, &context).await;
        assert!(matches!(result, Err(AuthError::ExpiredToken)));
    }

    #[tokio::test]
    async fn test_deleted_identity_is_rejected() {
        let (context, user_id) = context_with_user(Role::User).await;
        let token = context.tokens.issue(user_id, Role::User, LOGIN_TOKEN_TTL).unwrap();
        assert!(context.users.delete(user_id).await.unwrap());

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let result = AuthenticatedUser::from_request_parts(&mut parts, &context).await;
        assert!(matches!(result, Err(AuthError::IdentityNotFound)));
    }

    #[tokio::test]
    async fn test_stored_role_wins_over_claim() {
        let (context, user_id) = context_with_user(Role::User).await;
        // Claim says admin, the account says user
        let token = context.tokens.issue(user_id, Role::Admin, LOGIN_TOKEN_TTL).unwrap();

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let actor = AuthenticatedUser::from_request_parts(&mut parts, &context)
            .await
            .unwrap();
        assert_eq!(actor.role, Role::User);

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let result = AdminUser::from_request_parts(&mut parts, &context).await;
        assert!(matches!(result, Err(AuthError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_extractor_accepts_admin() {
        let (context, user_id) = context_with_user(Role::Admin).await;
        let token = context.tokens.issue(user_id, Role::Admin, LOGIN_TOKEN_TTL).unwrap();

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let AdminUser(actor) = AdminUser::from_request_parts(&mut parts, &context)
            .await
            .unwrap();
        assert_eq!(actor.user_id, user_id);
    }

    proptest! {
        #[test]
        fn prop_garbage_credentials_are_invalid(garbage in "[a-zA-Z0-9]{10,50}") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async {
                let (context, _) = context_with_user(Role::User).await;
                let mut parts = parts_with_auth(&format!("Bearer {}", garbage));
                AuthenticatedUser::from_request_parts(&mut parts, &context).await
            });
            prop_assert!(matches!(result, Err(AuthError::InvalidToken)));
        }
    }
}
