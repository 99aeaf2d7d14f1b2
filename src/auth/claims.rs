/// Session token claims
///
/// The signed payload of a session token: registered JWT claims only
/// (RFC 7519). Timestamps are Unix seconds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuthError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (stringified identity key)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

impl Claims {
    /// Build claims for `subject`, valid from `issued_at` for `ttl`
    pub fn new(
        subject: &impl Display,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            iss: issuer.to_string(),
            sub: subject.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    /// Parse the subject back into an identity key
    ///
    /// # Errors
    /// `MalformedSubject` if the subject does not parse as `K`
    pub fn subject<K: FromStr>(&self) -> Result<K, AuthError> {
        self.sub.parse::<K>().map_err(|_| AuthError::MalformedSubject)
    }

    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        self.subject::<Uuid>()
    }

    /// Expired once `now` reaches `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
