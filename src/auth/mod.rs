/// Authentication module
///
/// Bearer credential extraction, password hashing, session token signing
/// and refresh token lifecycle management.

mod bearer;
mod claims;
mod clock;
mod jwt;
mod password;
mod refresh_token;

pub use bearer::{bearer_token, extract_bearer_token};
pub use claims::Claims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::TokenSigner;
pub use password::{PasswordHasher, MAX_PASSWORD_BYTES};
pub use refresh_token::{generate_refresh_token, RefreshTokenManager};
