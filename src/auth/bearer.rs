/// Bearer credential extraction
///
/// Reads the raw token out of an `Authorization: Bearer <token>` header.
/// The prefix match is literal and case-sensitive; a value without the
/// prefix is passed through unchanged and left for the token checks to
/// reject.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Return the token part of an `Authorization` header value
///
/// # Errors
/// `MissingHeader` when the header is absent or empty
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    match header {
        None | Some("") => Err(AuthError::MissingHeader),
        Some(value) => Ok(value.strip_prefix(BEARER_PREFIX).unwrap_or(value)),
    }
}

/// Extract the bearer token from request headers
///
/// # Errors
/// - `MissingHeader` when there is no usable `Authorization` header
/// - `MalformedToken` when the header value is not visible ASCII
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedToken))
        .transpose()?;

    extract_bearer_token(header).map(str::to_string)
}
