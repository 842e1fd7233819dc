/// Security primitives for blog-service
///
/// - **password**: Argon2id password hashing
/// - **token**: HS256 session tokens carried in the `token` cookie
pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenIssuer};
