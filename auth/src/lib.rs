//! Authentication infrastructure library
//!
//! Reusable building blocks for credential handling:
//! - Password hashing (Argon2id)
//! - JWT issuing, verification and informational decoding
//!
//! The service crates define their own authentication flows and compose these
//! primitives; nothing in here touches storage or caching.
//!
//! # Examples
//!
//! ## Password hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest).unwrap());
//! assert!(!hasher.verify("not_my_password", &digest).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{SignOptions, TokenService, VerifyOptions};
//! use chrono::Duration;
//!
//! let tokens = TokenService::new(b"secret_key_at_least_32_bytes_long!", Duration::days(1));
//! let token = tokens.issue("user123", &SignOptions::default()).unwrap();
//! let claims = tokens.verify(&token, &VerifyOptions::default()).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```

pub mod jwt;
pub mod password;

pub use jwt::Claims;
pub use jwt::SignOptions;
pub use jwt::TokenError;
pub use jwt::TokenService;
pub use jwt::VerifyOptions;
pub use password::PasswordError;
pub use password::PasswordHasher;
