//! Password hashing, JWT issuance, and the request auth extractor.

pub mod extract;
pub mod jwt;
pub mod password;

pub use extract::AuthUser;
pub use jwt::JwtManager;
