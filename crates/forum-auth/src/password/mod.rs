//! Password hashing and credential policy.

pub mod hasher;
pub mod policy;

pub use hasher::PasswordHasher;
pub use policy::{validate_password, validate_username};
