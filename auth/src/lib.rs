//! Authentication core library
//!
//! Provides the security-critical pieces shared by the API services:
//! - Password hashing (PBKDF2-HMAC-SHA512, `pbkdf2$iterations$salt$hash` records)
//! - Signed, expiring identity tokens (HMAC-SHA256)
//! - The request gate turning an `Authorization` header into a verified identity
//!
//! Everything here is synchronous and free of I/O. Types are `Send + Sync` and
//! can be shared across request handlers behind an `Arc`.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::with_iterations(1_000);
//! let record = hasher.hash("my_password").unwrap().to_string();
//! assert!(hasher.verify("my_password", &record));
//! assert!(!hasher.verify("my_password", "garbage"));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{Claims, Role, TokenCodec};
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec.sign_with_ttl(&Claims::for_user(42, "ann", Role::User), 3600).unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.username.as_deref(), Some("ann"));
//! ```
//!
//! ## Request Gate
//! ```
//! use auth::{require_role, Authenticator, Claims, GateError, Role};
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//! let token = auth.issue_token(&Claims::for_user(42, "ann", Role::User)).unwrap();
//!
//! let identity = auth.gate().authenticate(&format!("Bearer {}", token)).unwrap();
//! assert_eq!(require_role(&identity, Role::Admin), Err(GateError::Forbidden));
//! ```

pub mod authenticator;
pub mod gate;
pub mod password;
pub mod token;

/// Signing secret used when a deployment provides none.
///
/// Publicly known; tokens signed with it can be forged by anyone. Development only.
pub const DEV_SECRET: &str = "dev-secret-change-me";

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use gate::require_role;
pub use gate::AuthGate;
pub use gate::GateError;
pub use gate::Identity;
pub use gate::Role;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordRecord;
pub use token::Claims;
pub use token::Subject;
pub use token::TokenCodec;
pub use token::TokenError;
