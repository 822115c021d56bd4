//! Password hashing, bearer tokens, the auth guard and the sign-up/sign-in handlers.

mod middleware;
mod password;
mod sign_in;
mod sign_up;
mod token;

pub use middleware::{CurrentUser, auth_guard};
pub use password::PasswordHash;
pub use sign_in::sign_in;
pub use sign_up::sign_up;
pub use token::{Claims, DEFAULT_TOKEN_DURATION, TokenKeys, issue_token, verify_token};
