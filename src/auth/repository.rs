// Credential store: trait plus the PostgreSQL repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::{
    error::AuthError,
    models::{NewUser, PendingOtp, User, UserChanges, UserRow},
};

/// Storage contract for accounts
///
/// Every mutation is a single atomic operation on one record; callers never
/// read, modify and write back.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account; a taken email is `EmailAlreadyExists`
    async fn insert(&self, user: NewUser) -> Result<User, AuthError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn list_all(&self) -> Result<Vec<User>, AuthError>;

    /// Apply the present fields; `None` when the account does not exist
    async fn update_fields(&self, id: i32, changes: UserChanges) -> Result<Option<User>, AuthError>;

    /// Remove the account; `false` when it did not exist
    async fn delete(&self, id: i32) -> Result<bool, AuthError>;

    /// Replace any pending reset code; `false` when the account does not exist
    async fn set_otp(&self, id: i32, otp: PendingOtp) -> Result<bool, AuthError>;

    /// The account whose pending code matches and has not expired at `now`
    async fn find_by_valid_otp(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError>;

    /// Atomically check the code, set the new hash and clear the code
    ///
    /// Of several concurrent calls with the same code at most one returns `Some`.
    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError>;
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(e: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AuthError::EmailAlreadyExists;
        }
    }
    AuthError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, phone, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, phone, email, password_hash, role,
                      reset_otp, reset_otp_expires_at, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, phone, email, password_hash, role,
                   reset_otp, reset_otp_expires_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, phone, email, password_hash, role,
                   reset_otp, reset_otp_expires_at, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn list_all(&self) -> Result<Vec<User>, AuthError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, phone, email, password_hash, role,
                   reset_otp, reset_otp_expires_at, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_fields(&self, id: i32, changes: UserChanges) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET username = COALESCE($1, username),
                phone = COALESCE($2, phone),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $5
            RETURNING id, username, phone, email, password_hash, role,
                      reset_otp, reset_otp_expires_at, created_at, updated_at
            "#,
        )
        .bind(changes.username)
        .bind(changes.phone)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(row.map(User::from))
    }

    async fn delete(&self, id: i32) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_otp(&self, id: i32, otp: PendingOtp) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_otp = $1, reset_otp_expires_at = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(otp.code)
        .bind(otp.expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_valid_otp(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, phone, email, password_hash, role,
                   reset_otp, reset_otp_expires_at, created_at, updated_at
            FROM users
            WHERE email = $1 AND reset_otp = $2 AND reset_otp_expires_at >= $3
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError> {
        // The WHERE clause re-checks the code under the row lock, so a second
        // concurrent reset sees the cleared columns and matches nothing.
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET password_hash = $1,
                reset_otp = NULL,
                reset_otp_expires_at = NULL,
                updated_at = NOW()
            WHERE email = $2 AND reset_otp = $3 AND reset_otp_expires_at >= $4
            RETURNING id, username, phone, email, password_hash, role,
                      reset_otp, reset_otp_expires_at, created_at, updated_at
            "#,
        )
        .bind(new_password_hash)
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}
