//!
//! userdir storage module
//! -----------------------
//! The directory core reaches storage only through the [`Provider`] trait. The
//! concrete engine is pluggable; [`MemoryProvider`] keeps everything in process
//! and is what the server binary and the tests run against.
//!
//! Contract every implementation must honour:
//! - login and email are unique across users (`Duplicate` otherwise),
//! - ids are assigned on `create`, positive and never reused,
//! - `update` refuses a record whose `updated_at` is not strictly later than the
//!   currently stored one (`Conflict`), so a stale read-merge-write cannot
//!   overwrite newer data.

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::{NewUser, User, UserId};

mod memory;

pub use memory::MemoryProvider;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("duplicate {field}")]
    Duplicate { field: &'static str },
    #[error("not found")]
    NotFound,
    #[error("stored record changed since it was read")]
    Conflict,
    #[error("storage failure: {0}")]
    Internal(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Insert a user whose password is already hashed; returns the new id.
    async fn create(&self, user: NewUser) -> StorageResult<UserId>;
    async fn find_by_email(&self, email: &str) -> StorageResult<User>;
    async fn find_by_id(&self, id: UserId) -> StorageResult<User>;
    async fn update(&self, user: &User) -> StorageResult<()>;
    async fn remove_by_id(&self, id: UserId) -> StorageResult<()>;
}

pub type SharedProvider = Arc<dyn Provider>;
