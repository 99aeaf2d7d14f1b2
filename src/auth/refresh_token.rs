/// Refresh Token Management
///
/// Refresh tokens are:
/// - Cryptographically secure random 64-character alphanumeric strings
/// - Stored verbatim as the lookup key of their row
/// - Reusable until they expire or are revoked (no rotation)
/// - Revocable; a revoked row stays in place with `revoked_at` set
///
/// Lifecycle: issued -> active -> expired | revoked. Both end states are
/// terminal.

use chrono::Duration;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::clock::Clock;
use crate::error::{AuthError, StoreError};
use crate::store::{RefreshTokenRecord, RefreshTokenStore};

/// 64 draws from 62 symbols, about 381 bits of entropy
const TOKEN_LENGTH: usize = 64;

/// Generate a new cryptographically secure refresh token value
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Issues, validates and revokes refresh tokens against a store
#[derive(Clone)]
pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl RefreshTokenManager {
    pub fn new(store: Arc<dyn RefreshTokenStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue and persist a refresh token for `owner_id`
    ///
    /// # Errors
    /// `PersistenceFailed` if the expiry is not representable or the row
    /// could not be stored; no token is returned in either case
    pub async fn issue(&self, owner_id: Uuid) -> Result<RefreshTokenRecord, AuthError> {
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(
                ttl_seconds = self.ttl.num_seconds(),
                "Refresh token expiry out of range"
            );
            AuthError::PersistenceFailed
        })?;
        let record = RefreshTokenRecord {
            token: generate_refresh_token(),
            owner_id,
            issued_at: now,
            expires_at,
            revoked_at: None,
        };

        self.store.insert(&record).await.map_err(|e| {
            tracing::error!(owner_id = %owner_id, error = %e, "Failed to persist refresh token");
            AuthError::PersistenceFailed
        })?;

        tracing::debug!(
            owner_id = %owner_id,
            expires_at = %record.expires_at,
            "Refresh token issued"
        );
        Ok(record)
    }

    /// Check that a refresh token is usable and return its owner
    ///
    /// Checks, in order:
    /// 1. Token exists
    /// 2. Token has not been revoked
    /// 3. Token has not expired
    ///
    /// # Errors
    /// `NotFound`, `TokenRevoked`, `TokenExpired`, or `PersistenceFailed`
    /// when the store lookup itself fails
    pub async fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        let now = self.clock.now();

        let record = self
            .store
            .find_by_token(token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Refresh token lookup failed");
                AuthError::PersistenceFailed
            })?
            .ok_or_else(|| {
                tracing::warn!("Refresh token not found");
                AuthError::NotFound
            })?;

        if record.revoked_at.is_some() {
            tracing::warn!(owner_id = %record.owner_id, "Attempt to use revoked refresh token");
            return Err(AuthError::TokenRevoked);
        }

        if now >= record.expires_at {
            tracing::info!(owner_id = %record.owner_id, "Refresh token expired");
            return Err(AuthError::TokenExpired);
        }

        Ok(record.owner_id)
    }

    /// Revoke a refresh token
    ///
    /// Revoking an already revoked token succeeds and keeps the original
    /// `revoked_at`.
    ///
    /// # Errors
    /// `NotFound` if no such token exists, `PersistenceFailed` if the
    /// store write fails
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let now = self.clock.now();

        match self.store.mark_revoked(token, now).await {
            Ok(()) => {
                tracing::info!("Refresh token revoked");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(AuthError::NotFound),
            Err(e) => {
                tracing::error!(error = %e, "Failed to revoke refresh token");
                Err(AuthError::PersistenceFailed)
            }
        }
    }

    /// Delete every refresh token (administrative reset)
    pub async fn reset(&self) -> Result<u64, AuthError> {
        let removed = self.store.delete_all().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to delete refresh tokens");
            AuthError::PersistenceFailed
        })?;

        tracing::info!(removed = removed, "All refresh tokens deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::store::InMemoryRefreshTokenStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    fn manager(clock: Arc<ManualClock>) -> RefreshTokenManager {
        RefreshTokenManager::new(
            Arc::new(InMemoryRefreshTokenStore::new()),
            clock,
            Duration::days(60),
        )
    }

    /// Store whose every operation fails
    struct BrokenStore;

    #[async_trait]
    impl RefreshTokenStore for BrokenStore {
        async fn insert(&self, _: &RefreshTokenRecord) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn find_by_token(&self, _: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn mark_revoked(&self, _: &str, _: DateTime<Utc>) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn delete_all(&self) -> Result<u64, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_different_tokens() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[tokio::test]
    async fn test_issue_then_validate() {
        let clock = Arc::new(ManualClock::starting_now());
        let manager = manager(clock.clone());
        let owner = Uuid::new_v4();

        let issued = manager.issue(owner).await.unwrap();

        assert_eq!(issued.owner_id, owner);
        assert_eq!(issued.issued_at, clock.now());
        assert_eq!(issued.expires_at, clock.now() + Duration::days(60));
        assert!(issued.revoked_at.is_none());
        assert_eq!(manager.validate(&issued.token).await, Ok(owner));
        // Not single-use
        assert_eq!(manager.validate(&issued.token).await, Ok(owner));
    }

    #[tokio::test]
    async fn test_revoked_token_rejected() {
        let manager = manager(Arc::new(ManualClock::starting_now()));
        let issued = manager.issue(Uuid::new_v4()).await.unwrap();

        manager.revoke(&issued.token).await.unwrap();

        assert_eq!(
            manager.validate(&issued.token).await,
            Err(AuthError::TokenRevoked)
        );
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let manager = manager(Arc::new(ManualClock::starting_now()));
        let issued = manager.issue(Uuid::new_v4()).await.unwrap();

        assert_eq!(manager.revoke(&issued.token).await, Ok(()));
        assert_eq!(manager.revoke(&issued.token).await, Ok(()));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let manager = manager(Arc::new(ManualClock::starting_now()));
        assert_eq!(manager.revoke("nope").await, Err(AuthError::NotFound));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let manager = manager(clock.clone());
        let issued = manager.issue(Uuid::new_v4()).await.unwrap();

        clock.advance(Duration::days(60) - Duration::seconds(1));
        assert!(manager.validate(&issued.token).await.is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(
            manager.validate(&issued.token).await,
            Err(AuthError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn test_revocation_reported_before_expiry() {
        let clock = Arc::new(ManualClock::starting_now());
        let manager = manager(clock.clone());
        let issued = manager.issue(Uuid::new_v4()).await.unwrap();

        manager.revoke(&issued.token).await.unwrap();
        clock.advance(Duration::days(61));

        assert_eq!(
            manager.validate(&issued.token).await,
            Err(AuthError::TokenRevoked)
        );
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let manager = manager(Arc::new(ManualClock::starting_now()));
        assert_eq!(manager.validate("unknown").await, Err(AuthError::NotFound));
    }

    #[tokio::test]
    async fn test_refresh_token_scenario() {
        let manager = manager(Arc::new(ManualClock::starting_now()));
        let u1 = Uuid::new_v4();

        let first = manager.issue(u1).await.unwrap();
        assert_eq!(manager.validate(&first.token).await, Ok(u1));

        manager.revoke(&first.token).await.unwrap();
        assert!(manager.validate(&first.token).await.is_err());

        let second = manager.issue(u1).await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(manager.validate(&second.token).await, Ok(u1));
    }

    #[tokio::test]
    async fn test_store_failures_are_persistence_errors() {
        let manager = RefreshTokenManager::new(
            Arc::new(BrokenStore),
            Arc::new(ManualClock::starting_now()),
            Duration::days(60),
        );

        assert_eq!(
            manager.issue(Uuid::new_v4()).await.map(|r| r.token),
            Err(AuthError::PersistenceFailed)
        );
        assert_eq!(manager.validate("x").await, Err(AuthError::PersistenceFailed));
        assert_eq!(manager.revoke("x").await, Err(AuthError::PersistenceFailed));
        assert_eq!(manager.reset().await, Err(AuthError::PersistenceFailed));
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_is_an_error() {
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let manager = RefreshTokenManager::new(
            store.clone(),
            Arc::new(ManualClock::starting_now()),
            Duration::days(100_000_000),
        );

        assert_eq!(
            manager.issue(Uuid::new_v4()).await.map(|r| r.token),
            Err(AuthError::PersistenceFailed)
        );
        assert_eq!(store.delete_all().await, Ok(0));
    }

    #[tokio::test]
    async fn test_reset_removes_everything() {
        let manager = manager(Arc::new(ManualClock::starting_now()));
        let issued = manager.issue(Uuid::new_v4()).await.unwrap();

        assert_eq!(manager.reset().await, Ok(1));
        assert_eq!(manager.validate(&issued.token).await, Err(AuthError::NotFound));
    }
}
