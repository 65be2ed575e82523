use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::{Provider, StorageError, StorageResult};
use crate::model::{NewUser, User, UserId};

#[derive(Default)]
struct Tables {
    last_id: u64,
    users: BTreeMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    by_login: HashMap<String, UserId>,
}

impl Tables {
    /// Uniqueness check for `login`/`email`, ignoring the row `owner` itself.
    fn check_unique(&self, login: &str, email: &str, owner: Option<UserId>) -> StorageResult<()> {
        if let Some(id) = self.by_login.get(login) {
            if Some(*id) != owner { return Err(StorageError::Duplicate { field: "login" }); }
        }
        if let Some(id) = self.by_email.get(email) {
            if Some(*id) != owner { return Err(StorageError::Duplicate { field: "email" }); }
        }
        Ok(())
    }
}

/// In-process [`Provider`]. All maps sit behind one lock so each call is atomic.
#[derive(Default)]
pub struct MemoryProvider {
    inner: RwLock<Tables>,
}

impl MemoryProvider {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.inner.read().users.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[async_trait]
impl Provider for MemoryProvider {
    async fn create(&self, user: NewUser) -> StorageResult<UserId> {
        let mut t = self.inner.write();
        t.check_unique(&user.login, &user.email, None)?;
        let id = UserId::new(t.last_id + 1).ok_or_else(|| StorageError::Internal("id space exhausted".into()))?;
        t.last_id = id.get();
        t.by_login.insert(user.login.clone(), id);
        t.by_email.insert(user.email.clone(), id);
        t.users.insert(id, User {
            id,
            login: user.login,
            password_hash: user.password,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: user.created_at,
            updated_at: None,
        });
        debug!(target: "storage", id = %id, "user created");
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<User> {
        let t = self.inner.read();
        let id = t.by_email.get(email).ok_or(StorageError::NotFound)?;
        t.users.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn find_by_id(&self, id: UserId) -> StorageResult<User> {
        self.inner.read().users.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn update(&self, user: &User) -> StorageResult<()> {
        let mut t = self.inner.write();
        let current = t.users.get(&user.id).ok_or(StorageError::NotFound)?;
        // the row must not have moved past what the writer merged against
        let Some(next) = user.updated_at else { return Err(StorageError::Conflict) };
        if next <= current.latest_write() {
            return Err(StorageError::Conflict);
        }
        t.check_unique(&user.login, &user.email, Some(user.id))?;

        let (old_login, old_email) = (current.login.clone(), current.email.clone());
        t.by_login.remove(&old_login);
        t.by_email.remove(&old_email);
        t.by_login.insert(user.login.clone(), user.id);
        t.by_email.insert(user.email.clone(), user.id);
        t.users.insert(user.id, user.clone());
        debug!(target: "storage", id = %user.id, "user updated");
        Ok(())
    }

    async fn remove_by_id(&self, id: UserId) -> StorageResult<()> {
        let mut t = self.inner.write();
        let removed = t.users.remove(&id).ok_or(StorageError::NotFound)?;
        t.by_login.remove(&removed.login);
        t.by_email.remove(&removed.email);
        debug!(target: "storage", id = %id, "user removed");
        Ok(())
    }
}
