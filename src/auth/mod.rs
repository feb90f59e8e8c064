// Authentication module
// Accounts, JWT credentials, authorization policy and password reset codes

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod otp;
pub mod password;
pub mod policy;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{AdminUser, AuthContext, AuthenticatedUser};
pub use models::{Role, User, UserResponse};
pub use otp::OtpService;
pub use repository::{UserRepository, UserStore};
pub use service::AuthService;
pub use token::TokenService;
