//! User repository abstraction
//!
//! The directory talks to storage through the [`UserRepository`] trait;
//! each directory operation maps to a single atomic read-modify-write
//! against the implementation. The storage layer is the authoritative
//! guard for login uniqueness — the directory's own duplicate checks are
//! an optimization on top of it.

use crate::error::{duplicate_login, user_not_found, ApiResult};
use crate::user::User;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistent store for user records, keyed by id with a unique login index
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by exact (case-sensitive) login
    async fn find_by_login(&self, login: &str) -> ApiResult<Option<User>>;

    /// Whether any record, active or revoked, holds this login
    async fn exists_by_login(&self, login: &str) -> ApiResult<bool>;

    /// Insert a new record; fails with `DuplicateLogin` if the login is taken
    async fn insert(&self, user: User) -> ApiResult<User>;

    /// Replace the record with the same id; fails with `NotFound` if absent
    /// and with `DuplicateLogin` if a rename collides with another record
    async fn update(&self, user: User) -> ApiResult<User>;

    /// Permanently remove the record with this id
    async fn remove(&self, id: Uuid) -> ApiResult<()>;

    /// All records matching the predicate, in unspecified order
    async fn list_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a User) -> bool + Sync),
    ) -> ApiResult<Vec<User>>;
}

/// Record map plus its secondary login index; always mutated together
#[derive(Default)]
struct Store {
    users: HashMap<Uuid, User>,
    login_index: HashMap<String, Uuid>,
}

/// In-memory repository
///
/// Both maps live behind one lock so a rename or removal is never
/// partially visible and no two calls can wait on each other.
pub struct MemoryUserRepository {
    store: RwLock<Store>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_login(&self, login: &str) -> ApiResult<Option<User>> {
        let store = self.store.read().await;

        Ok(store
            .login_index
            .get(login)
            .and_then(|id| store.users.get(id).cloned()))
    }

    async fn exists_by_login(&self, login: &str) -> ApiResult<bool> {
        let store = self.store.read().await;
        Ok(store.login_index.contains_key(login))
    }

    async fn insert(&self, user: User) -> ApiResult<User> {
        let mut store = self.store.write().await;

        if store.login_index.contains_key(&user.login) {
            return Err(duplicate_login(&user.login));
        }

        store.login_index.insert(user.login.clone(), user.id);
        store.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(&self, user: User) -> ApiResult<User> {
        let mut store = self.store.write().await;

        let previous_login = store
            .users
            .get(&user.id)
            .map(|u| u.login.clone())
            .ok_or_else(|| user_not_found(&user.login))?;

        if previous_login != user.login {
            if let Some(other) = store.login_index.get(&user.login) {
                if *other != user.id {
                    return Err(duplicate_login(&user.login));
                }
            }
            store.login_index.remove(&previous_login);
            store.login_index.insert(user.login.clone(), user.id);
        }

        store.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn remove(&self, id: Uuid) -> ApiResult<()> {
        let mut store = self.store.write().await;

        let user = store
            .users
            .remove(&id)
            .ok_or_else(|| user_not_found(&id.to_string()))?;

        store.login_index.remove(&user.login);

        Ok(())
    }

    async fn list_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a User) -> bool + Sync),
    ) -> ApiResult<Vec<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .filter(|u| predicate(u))
            .cloned()
            .collect())
    }
}
