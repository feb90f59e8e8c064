// JWT token generation and validation service

use crate::auth::{error::AuthError, models::Role};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Lifetime of the token returned by signup (7 days)
pub const SIGNUP_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Lifetime of the token returned by login (1 day)
pub const LOGIN_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,  // user_id
    pub role: Role,
    pub iat: i64,  // issued at timestamp
    pub exp: i64,  // expiration timestamp
    pub jti: String,
}

/// Why a presented token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Unparsable, wrongly signed or tampered
    Malformed,
    /// Correctly signed but past its expiry
    Expired,
}

/// Token service for JWT operations
///
/// Holds the keys derived from the signing secret; nothing is stored per token.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a new TokenService with secret key
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the caller's clock in `verify_at`
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for `user_id` that expires `ttl` from now
    pub fn issue(&self, user_id: i32, role: Role, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(user_id, role, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: i32,
        role: Role,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| AuthError::TokenGenerationError("token ttl out of range".to_string()))?;

        let claims = Claims {
            sub: user_id,
            role,
            iat,
            exp: iat + ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Validate a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, TokenRejection> {
        self.verify_at(token, Utc::now())
    }

    /// Validate a token against `now`
    ///
    /// The signature is checked before the expiry, so a tampered token is
    /// always `Malformed` even when its claims are also stale.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenRejection> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                TokenRejection::Malformed
            })?;

        if now.timestamp() > claims.exp {
            return Err(TokenRejection::Expired);
        }

        Ok(claims)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use proptest::prelude::*;

    // Helper to create a test token service
    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes")
    }

    #[test]
    fn test_signup_token_lasts_7_days() {
        let service = test_token_service();
        let token = service.issue(1, Role::User, SIGNUP_TOKEN_TTL).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 604800);
    }

    #[test]
    fn test_login_token_lasts_1_day() {
        let service = test_token_service();
        let token = service.issue(1, Role::User, LOGIN_TOKEN_TTL).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_claims_carry_subject_and_role() {
        let service = test_token_service();
        let token = service.issue(42, Role::ShopOwner, LOGIN_TOKEN_TTL).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::ShopOwner);
    }

    #[test]
    fn test_tokens_issued_in_same_second_differ() {
        let service = test_token_service();
        let now = Utc::now();
        let first = service.issue_at(7, Role::User, LOGIN_TOKEN_TTL, now).unwrap();
        let second = service.issue_at(7, Role::User, LOGIN_TOKEN_TTL, now).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_expiry_boundary() {
        let service = test_token_service();
        let issued = Utc::now();
        let ttl = Duration::from_secs(3600);
        let token = service.issue_at(5, Role::User, ttl, issued).unwrap();
        let expiry = issued + ChronoDuration::seconds(3600);

        assert!(service.verify_at(&token, expiry - ChronoDuration::seconds(1)).is_ok());
        assert!(service.verify_at(&token, expiry).is_ok());
        assert_eq!(
            service.verify_at(&token, expiry + ChronoDuration::seconds(1)),
            Err(TokenRejection::Expired)
        );
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        for token in [
            "",
            "not.a.token",
            "invalid_token_format",
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature",
        ] {
            assert_eq!(service.verify(token), Err(TokenRejection::Malformed));
        }
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new("secret1");
        let service2 = TokenService::new("secret2");

        let token = service1.issue(1, Role::Admin, LOGIN_TOKEN_TTL).unwrap();

        assert!(service1.verify(&token).is_ok());
        assert_eq!(service2.verify(&token), Err(TokenRejection::Malformed));
    }

    #[test]
    fn test_expired_and_forged_token_is_malformed() {
        let service = test_token_service();
        let long_ago = Utc::now() - ChronoDuration::days(30);
        let token = TokenService::new("other_secret")
            .issue_at(1, Role::User, LOGIN_TOKEN_TTL, long_ago)
            .unwrap();

        assert_eq!(service.verify(&token), Err(TokenRejection::Malformed));
    }

    // Property-based tests using proptest

    proptest! {
        #[test]
        fn prop_valid_tokens_round_trip_subject(user_id in 1i32..1000000) {
            let service = test_token_service();
            let token = service.issue(user_id, Role::User, SIGNUP_TOKEN_TTL)?;
            let claims = service.verify(&token).unwrap();
            prop_assert_eq!(claims.sub, user_id);
        }

        #[test]
        fn prop_tampered_tokens_are_malformed(
            user_id in 1i32..1000000,
            index in any::<prop::sample::Index>(),
            replacement in "[A-Za-z0-9_.-]",
        ) {
            let service = test_token_service();
            let token = service.issue(user_id, Role::User, LOGIN_TOKEN_TTL)?;

            let position = index.index(token.len());
            let current = &token[position..position + 1];
            prop_assume!(current != replacement);

            let mut tampered = token.clone();
            tampered.replace_range(position..position + 1, &replacement);

            prop_assert_eq!(service.verify(&tampered), Err(TokenRejection::Malformed));
        }

        #[test]
        fn prop_random_strings_are_malformed(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_token_service();
            prop_assert_eq!(service.verify(&malformed), Err(TokenRejection::Malformed));
        }
    }
}
