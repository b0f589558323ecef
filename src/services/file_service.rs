use super::{AuthService, FileDriver, ThumbnailJob, ThumbnailQueue};
use crate::stores::{
    models::{File, FileKind},
    DocumentStore, DocumentStoreError,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Fixed number of entries per listing page.
pub const FILE_PAGE_SIZE: usize = 20;

#[derive(Error, Debug)]
pub enum CreateFileError {
    #[error("name must not be empty")]
    MissingName,
    #[error("payload must not be empty")]
    MissingData,
    #[error("parent does not exist")]
    ParentNotFound,
    #[error("parent is not a folder")]
    ParentNotFolder,
    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FileServiceError {
    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum GetContentError {
    #[error("a folder has no content")]
    FolderHasNoContent,
    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The file catalog: creates, lists and inspects records, flips visibility
/// and fetches content. All metadata lives in the document store; bytes live
/// behind the file driver; image uploads feed the thumbnail queue.
pub struct FileService {
    document_store: Arc<dyn DocumentStore + Send + Sync>,
    file_driver: Arc<dyn FileDriver + Send + Sync>,
    thumbnail_queue: Arc<dyn ThumbnailQueue + Send + Sync>,
    auth_service: Arc<AuthService>,
}

impl FileService {
    pub fn new(
        document_store: Arc<dyn DocumentStore + Send + Sync>,
        file_driver: Arc<dyn FileDriver + Send + Sync>,
        thumbnail_queue: Arc<dyn ThumbnailQueue + Send + Sync>,
        auth_service: Arc<AuthService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            document_store,
            file_driver,
            thumbnail_queue,
            auth_service,
        })
    }

    /// Verifies that `parent_id`, if set, references an existing folder.
    /// The folder may belong to any user; ownership is enforced on the
    /// child, not transitively.
    async fn validate_parent(&self, parent_id: Option<Uuid>) -> Result<(), CreateFileError> {
        let parent_id = match parent_id {
            Some(parent_id) => parent_id,
            None => return Ok(()),
        };

        let parent = self
            .document_store
            .file_by_id(parent_id)
            .await?
            .ok_or(CreateFileError::ParentNotFound)?;

        if !parent.is_folder() {
            return Err(CreateFileError::ParentNotFolder);
        }

        Ok(())
    }

    /// Creates a folder record. Folders never carry a blob.
    pub async fn create_folder(
        &self,
        owner_id: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
        is_public: bool,
    ) -> Result<File, CreateFileError> {
        if name.is_empty() {
            return Err(CreateFileError::MissingName);
        }

        self.validate_parent(parent_id).await?;

        let file = File {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            kind: FileKind::Folder,
            is_public,
            parent_id,
            local_path: None,
        };

        self.document_store.insert_file(file.clone()).await?;

        Ok(file)
    }

    /// Stores the payload as a blob, then inserts the catalog record.
    /// Image uploads additionally enqueue a thumbnail job after the record
    /// commits; a failed enqueue is logged and never rolls back the upload.
    pub async fn create_content(
        &self,
        owner_id: Uuid,
        name: &str,
        kind: FileKind,
        parent_id: Option<Uuid>,
        data: &[u8],
        is_public: bool,
    ) -> Result<File, CreateFileError> {
        debug_assert!(kind != FileKind::Folder);

        if name.is_empty() {
            return Err(CreateFileError::MissingName);
        }

        if data.is_empty() {
            return Err(CreateFileError::MissingData);
        }

        self.validate_parent(parent_id).await?;

        let handle = self.file_driver.store(data).await?;
        let file = File {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            kind,
            is_public,
            parent_id,
            local_path: Some(handle),
        };

        self.document_store.insert_file(file.clone()).await?;

        if kind == FileKind::Image {
            let job = ThumbnailJob::new(file.id, owner_id);

            if let Err(err) = self.thumbnail_queue.enqueue(job).await {
                // thumbnailing is best-effort; the upload stands
                log::warn!(target: "file_service", file_id:serde = file.id, err:err; "Failed to enqueue thumbnail job.");
            }
        }

        Ok(file)
    }

    /// Retrieves a file owned by `user_id`. Absent and not-owned collapse
    /// into `None`; the caller cannot tell them apart.
    pub async fn get_file(
        &self,
        user_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<File>, FileServiceError> {
        let file = self
            .document_store
            .file_by_id(file_id)
            .await?
            .filter(|file| self.auth_service.authorize_owner(user_id, file));

        Ok(file)
    }

    /// Lists files owned by `user_id` under `parent_id`, offset-paged with a
    /// fixed page size. Pages can shift under concurrent inserts.
    pub async fn list_files(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        page: u32,
    ) -> Result<Vec<File>, FileServiceError> {
        let skip = page as usize * FILE_PAGE_SIZE;
        let files = self
            .document_store
            .files_by_parent(user_id, parent_id, skip, FILE_PAGE_SIZE)
            .await?;

        Ok(files)
    }

    /// Sets the visibility flag on a file owned by `user_id`. Idempotent:
    /// re-applying the current value is a no-op success.
    pub async fn set_visibility(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        is_public: bool,
    ) -> Result<Option<File>, FileServiceError> {
        let file = match self.get_file(user_id, file_id).await? {
            Some(file) => file,
            None => return Ok(None),
        };

        let updated = self
            .document_store
            .set_file_visibility(file.id, is_public)
            .await?;

        Ok(updated)
    }

    /// Fetches the raw content of a file for an optionally authenticated
    /// requester. Unreadable (private, not owned) and missing files both
    /// come back as `None`; folders are an error of their own.
    pub async fn get_file_content(
        &self,
        requester_id: Option<Uuid>,
        file_id: Uuid,
    ) -> Result<Option<(File, Vec<u8>)>, GetContentError> {
        let file = match self.document_store.file_by_id(file_id).await? {
            Some(file) => file,
            None => return Ok(None),
        };

        if !self.auth_service.authorize_read(requester_id, &file) {
            return Ok(None);
        }

        if file.is_folder() {
            return Err(GetContentError::FolderHasNoContent);
        }

        let handle = match &file.local_path {
            Some(handle) => handle.clone(),
            None => return Ok(None),
        };

        let bytes = match self.file_driver.retrieve(&handle).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        Ok(Some((file, bytes)))
    }

    pub async fn count_files(&self) -> Result<u64, FileServiceError> {
        let count = self.document_store.count_files().await?;
        Ok(count)
    }
}
