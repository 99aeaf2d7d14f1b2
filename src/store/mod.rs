/// Persistence collaborators
///
/// The auth core only talks to storage through these traits. Postgres
/// implementations back the running service; the in-memory ones back tests
/// and local runs without a database.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;

pub use memory::{InMemoryRefreshTokenStore, InMemoryUserStore};
pub use postgres::{PgRefreshTokenStore, PgUserStore};

/// A persisted refresh token row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    /// Opaque token value, also the primary key
    pub token: String,
    pub owner_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// A persisted user row, holding the user's credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    /// bcrypt string; never the plaintext
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Set `revoked_at` unless it is already set.
    ///
    /// Returns `StoreError::NotFound` when no row has this token.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove every row; returns how many were removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `StoreError::Duplicate` when the email is taken.
    async fn insert(&self, user: &UserRecord) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Remove every user; returns how many were removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}
