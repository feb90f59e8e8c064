// Authorization decisions over an authenticated actor
//
// Every check reads the role re-fetched by the extractor, never the token claim.

use tracing::warn;

use crate::auth::{error::AuthError, middleware::AuthenticatedUser, models::Role};

/// Account read/update/delete: the account itself or an admin
pub fn ensure_self_or_admin(actor: &AuthenticatedUser, user_id: i32) -> Result<(), AuthError> {
    if actor.user_id == user_id || actor.role == Role::Admin {
        return Ok(());
    }
    deny(actor, "You can only access your own account")
}

pub fn ensure_admin(actor: &AuthenticatedUser) -> Result<(), AuthError> {
    if actor.role == Role::Admin {
        return Ok(());
    }
    deny(actor, "Admin access required")
}

/// Opening a shop needs the shop-owner or admin role
pub fn ensure_can_open_shop(actor: &AuthenticatedUser) -> Result<(), AuthError> {
    match actor.role {
        Role::ShopOwner | Role::Admin => Ok(()),
        Role::User => deny(actor, "Only shop owners can create shops"),
    }
}

/// Strict ownership; admins get no bypass
pub fn ensure_owner(actor: &AuthenticatedUser, owner_id: i32) -> Result<(), AuthError> {
    if actor.user_id == owner_id {
        return Ok(());
    }
    deny(actor, "You do not own this shop")
}

/// Ownership with admin bypass, used for reads
pub fn ensure_owner_or_admin(actor: &AuthenticatedUser, owner_id: i32) -> Result<(), AuthError> {
    if actor.user_id == owner_id || actor.role == Role::Admin {
        return Ok(());
    }
    deny(actor, "You do not own this shop")
}

fn deny(actor: &AuthenticatedUser, message: &str) -> Result<(), AuthError> {
    warn!(
        "Authorization denied: user_id={}, role={}, reason={}",
        actor.user_id, actor.role, message
    );
    Err(AuthError::Forbidden(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserResponse;
    use chrono::Utc;

    fn actor(user_id: i32, role: Role) -> AuthenticatedUser {
        let now = Utc::now();
        AuthenticatedUser {
            user_id,
            role,
            user: UserResponse {
                id: user_id,
                username: "actor".to_string(),
                phone: "9876543210".to_string(),
                email: format!("actor{}@example.com", user_id),
                role,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn test_self_or_admin() {
        assert!(ensure_self_or_admin(&actor(1, Role::User), 1).is_ok());
        assert!(ensure_self_or_admin(&actor(9, Role::Admin), 1).is_ok());
        assert!(matches!(
            ensure_self_or_admin(&actor(2, Role::ShopOwner), 1),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_only() {
        assert!(ensure_admin(&actor(1, Role::Admin)).is_ok());
        assert!(ensure_admin(&actor(1, Role::ShopOwner)).is_err());
        assert!(ensure_admin(&actor(1, Role::User)).is_err());
    }

    #[test]
    fn test_plain_users_cannot_open_shops() {
        assert!(ensure_can_open_shop(&actor(1, Role::ShopOwner)).is_ok());
        assert!(ensure_can_open_shop(&actor(1, Role::Admin)).is_ok());
        assert!(ensure_can_open_shop(&actor(1, Role::User)).is_err());
    }

    #[test]
    fn test_strict_owner_has_no_admin_bypass() {
        assert!(ensure_owner(&actor(5, Role::ShopOwner), 5).is_ok());
        assert!(ensure_owner(&actor(6, Role::ShopOwner), 5).is_err());
        assert!(ensure_owner(&actor(7, Role::Admin), 5).is_err());
    }

    #[test]
    fn test_owner_or_admin_read() {
        assert!(ensure_owner_or_admin(&actor(5, Role::ShopOwner), 5).is_ok());
        assert!(ensure_owner_or_admin(&actor(7, Role::Admin), 5).is_ok());
        assert!(ensure_owner_or_admin(&actor(6, Role::User), 5).is_err());
    }
}
