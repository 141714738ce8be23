//! Repository implementations for the forum entities.

pub mod message;
pub mod refresh_token;
pub mod user;

pub use message::MessageRepository;
pub use refresh_token::RefreshTokenRepository;
pub use user::UserRepository;
