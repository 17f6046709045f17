//! In-process fakes for service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tollgate_cache::{Cache, CacheError, CacheStore};
use tollgate_core::error::CoreError;
use tollgate_core::types::DbId;
use tollgate_db::models::user::{CreateUser, User};

use super::credentials::{CredentialStore, DUPLICATE_IDENTITY_MESSAGE};
use super::lifecycle::TokenLifecycle;

/// Credential store over a `Vec`, counting every call by operation.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<Vec<User>>,
    pub find_by_username_calls: AtomicUsize,
    pub username_exists_calls: AtomicUsize,
    pub email_exists_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed an identity directly, bypassing `insert`.
    pub fn seed(&self, username: &str, email: &str, password_hash: &str) -> User {
        let mut users = self.users.lock().unwrap();
        let user = User {
            id: users.len() as DbId + 1,
            username: username.to_string(),
            email: email.to_string(),
            phone: "08123456789".to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.push(user.clone());
        user
    }

    /// Rename a stored identity in place.
    pub fn rename(&self, from: &str, to: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.username == from) {
            user.username = to.to_string();
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CoreError> {
        self.find_by_username_calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, input: &CreateUser) -> Result<Option<User>, CoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let taken = {
            let users = self.users.lock().unwrap();
            users
                .iter()
                .any(|u| u.username == input.username || u.email == input.email)
        };
        if taken {
            return Err(CoreError::Conflict(DUPLICATE_IDENTITY_MESSAGE.into()));
        }
        Ok(Some(self.seed(&input.username, &input.email, &input.password_hash)))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, CoreError> {
        self.username_exists_calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users.iter().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, CoreError> {
        self.email_exists_calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users.iter().any(|u| u.email == email))
    }
}

/// Credential store whose `insert` reports success but returns no row.
pub struct SilentInsertStore;

#[async_trait]
impl CredentialStore for SilentInsertStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, CoreError> {
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, CoreError> {
        Ok(None)
    }

    async fn insert(&self, _input: &CreateUser) -> Result<Option<User>, CoreError> {
        Ok(None)
    }

    async fn username_exists(&self, _username: &str) -> Result<bool, CoreError> {
        Ok(false)
    }

    async fn email_exists(&self, _email: &str) -> Result<bool, CoreError> {
        Ok(false)
    }
}

/// Cache backend whose every command fails, standing in for an unreachable Redis.
pub struct UnavailableStore;

#[async_trait]
impl CacheStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }
}

pub fn unavailable_cache() -> Cache {
    Cache::new(Arc::new(UnavailableStore))
}

/// How a [`ScriptedLifecycle`] operation behaves.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
    Panic,
}

/// Lifecycle with scripted outcomes that records which operations ran.
pub struct ScriptedLifecycle {
    pub issue: Outcome,
    pub revoke: Outcome,
    pub consume: Outcome,
    pub revoked: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedLifecycle {
    pub fn new() -> Self {
        Self {
            issue: Outcome::Succeed,
            revoke: Outcome::Succeed,
            consume: Outcome::Succeed,
            revoked: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, outcome: Outcome) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(op);
        match outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(CoreError::Internal(format!("{op} failed"))),
            Outcome::Panic => panic!("{op} panicked"),
        }
    }
}

#[async_trait]
impl TokenLifecycle for ScriptedLifecycle {
    async fn issue(&self, _token: &str, _user_id: DbId, _ttl: Duration) -> Result<(), CoreError> {
        self.record("issue", self.issue)
    }

    async fn is_revoked(&self, _token: &str) -> bool {
        self.calls.lock().unwrap().push("is_revoked");
        self.revoked
    }

    async fn is_redeemable(&self, _token: &str) -> Result<bool, CoreError> {
        self.calls.lock().unwrap().push("is_redeemable");
        Ok(!self.revoked)
    }

    async fn revoke(&self, _token: &str, _ttl: Duration) -> Result<(), CoreError> {
        self.record("revoke", self.revoke)
    }

    async fn consume(&self, _token: &str) -> Result<bool, CoreError> {
        self.record("consume", self.consume).map(|()| true)
    }
}
