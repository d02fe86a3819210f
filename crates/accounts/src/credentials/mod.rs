//! Password hashing and bearer token issuance

pub mod password;
pub mod token;

pub use password::PasswordHasher;
pub use token::{Claims, TokenIssuer};
