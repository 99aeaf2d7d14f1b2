/// Middleware module
///
/// Custom middleware for session authentication.

mod jwt_middleware;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
