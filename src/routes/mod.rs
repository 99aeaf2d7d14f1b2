mod admin;
mod auth;
mod health_check;

pub use admin::reset;
pub use auth::{
    clamp_session_ttl, create_user, get_current_user, login, refresh, revoke, CreateUserRequest,
    LoginRequest, LoginResponse, TokenResponse, UserResponse,
};
pub use health_check::health_check;
