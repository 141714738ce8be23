//! # forum-core
//!
//! Core crate for the forum services. Contains configuration schemas and
//! the unified error system shared by the auth, realtime and API crates.
//!
//! This crate has **no** internal dependencies on other forum crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
