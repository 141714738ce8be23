//! # forum-auth
//!
//! The session authority for the forum platform.
//!
//! ## Modules
//!
//! - `jwt`: HS256 access token encoding and verification
//! - `password`: Argon2id hashing and credential policy
//! - `token`: opaque refresh token generation and hashing
//! - `store`: credential store traits with PostgreSQL and in-memory backends
//! - `authority`: register, login, refresh rotation, validation, logout
//! - `validator`: the validation contract consumed by other services
//! - `client`: HTTP client for a remote authority

pub mod authority;
pub mod client;
pub mod jwt;
pub mod password;
pub mod rpc;
pub mod store;
pub mod token;
pub mod validator;

pub use authority::TokenAuthority;
pub use client::AuthClient;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use store::{MemoryCredentialStore, RefreshTokenStore, UserStore};
pub use validator::SessionValidator;
