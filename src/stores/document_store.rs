use super::models::{File, User};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Durable collection of user and file records. The store serializes its own
/// writes; callers hold no locks across calls.
#[async_trait]
pub trait DocumentStore {
    /// Reports whether the backing store is reachable.
    async fn is_alive(&self) -> bool;

    async fn insert_user(&self, user: User) -> Result<(), DocumentStoreError>;

    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>, DocumentStoreError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DocumentStoreError>;

    async fn count_users(&self) -> Result<u64, DocumentStoreError>;

    async fn insert_file(&self, file: File) -> Result<(), DocumentStoreError>;

    async fn file_by_id(&self, file_id: Uuid) -> Result<Option<File>, DocumentStoreError>;

    /// Files owned by `owner_id` whose parent matches `parent_id` exactly
    /// (`None` selects top-level entries), in insertion order.
    async fn files_by_parent(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<File>, DocumentStoreError>;

    /// Flips the visibility flag. Returns the updated record, or `None` if
    /// the file does not exist.
    async fn set_file_visibility(
        &self,
        file_id: Uuid,
        is_public: bool,
    ) -> Result<Option<File>, DocumentStoreError>;

    async fn count_files(&self) -> Result<u64, DocumentStoreError>;
}
