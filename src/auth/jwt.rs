/// Session Token Signing and Verification
///
/// Session tokens are HS256 JWTs over `{iss, sub, iat, exp}`. They are
/// stateless: never stored, never looked up, and not revocable before
/// they expire.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use crate::auth::claims::Claims;
use crate::auth::clock::Clock;
use crate::configuration::AuthSettings;
use crate::error::AuthError;

/// Mints and verifies session tokens with one shared secret
pub struct TokenSigner {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenSigner {
    pub fn new(settings: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock instead.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[&settings.issuer]);

        Self {
            issuer: settings.issuer.clone(),
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            clock,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Mint a session token for `subject` valid for `ttl`
    ///
    /// Any `ttl` is accepted; capping it is the login handler's job.
    ///
    /// # Errors
    /// `SigningFailed` if the JWT cannot be encoded
    pub fn mint(&self, subject: &impl Display, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(subject, self.clock.now(), ttl, &self.issuer);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Session token signing failed");
            AuthError::SigningFailed
        })
    }

    /// Verify a session token and return its subject
    ///
    /// The caller still has to check that the subject exists.
    ///
    /// # Errors
    /// - `SignatureInvalid` if the signature or algorithm does not match
    /// - `MalformedToken` if the token is not a JWT from this issuer
    /// - `TokenExpired` if `exp` has been reached
    /// - `MalformedSubject` if `sub` does not parse as `K`
    pub fn verify<K: FromStr>(&self, token: &str) -> Result<K, AuthError> {
        let now = self.clock.now();

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        AuthError::SignatureInvalid
                    }
                    _ => AuthError::MalformedToken,
                };
                tracing::debug!(error = %e, kind = err.kind(), "Session token rejected");
                err
            })?;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        claims.subject()
    }
}
