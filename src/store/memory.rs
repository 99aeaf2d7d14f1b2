use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenStore, UserRecord, UserStore};
use crate::error::StoreError;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
}

/// Refresh tokens keyed by token value
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    rows: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        let mut rows = lock(&self.rows)?;
        if rows.contains_key(&record.token) {
            return Err(StoreError::Duplicate("refresh token".to_string()));
        }
        rows.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(lock(&self.rows)?.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut rows = lock(&self.rows)?;
        let row = rows.get_mut(token).ok_or(StoreError::NotFound)?;
        row.revoked_at.get_or_insert(at);
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut rows = lock(&self.rows)?;
        let removed = rows.len() as u64;
        rows.clear();
        Ok(removed)
    }
}

/// Users keyed by id
#[derive(Default)]
pub struct InMemoryUserStore {
    rows: Mutex<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut rows = lock(&self.rows)?;
        if rows.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        rows.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(lock(&self.rows)?
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(lock(&self.rows)?.get(&id).cloned())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut rows = lock(&self.rows)?;
        let removed = rows.len() as u64;
        rows.clear();
        Ok(removed)
    }
}
