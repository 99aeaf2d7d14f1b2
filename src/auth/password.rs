/// Password Hashing and Verification
///
/// One-way, salted, adaptive hashing with bcrypt. The encoded hash carries
/// the algorithm version, cost, salt and digest, so verification needs
/// nothing but the stored string.

use bcrypt::{hash, verify};

use crate::error::AuthError;

/// bcrypt only reads this many bytes of input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hasher with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt
    ///
    /// # Errors
    /// `HashingFailed` if bcrypt cannot run: the password is longer than
    /// bcrypt's input limit or the configured cost is out of range
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        // Longer input would be silently truncated.
        if password.len() > MAX_PASSWORD_BYTES {
            tracing::error!(
                length = password.len(),
                "Password exceeds bcrypt input limit"
            );
            return Err(AuthError::HashingFailed);
        }

        hash(password, self.cost).map_err(|e| {
            tracing::error!(error = %e, cost = self.cost, "Password hashing failed");
            AuthError::HashingFailed
        })
    }

    /// Verify a password against a stored hash
    ///
    /// # Errors
    /// - `HashMismatch` if the password does not match
    /// - `MalformedHash` if `hash` was not produced by [`PasswordHasher::hash`]
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        match verify(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::HashMismatch),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                Err(AuthError::MalformedHash)
            }
        }
    }
}
