use super::FileDriver;
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Blob storage on the local disk. Every blob is a file directly under the
/// root directory, named by the handle.
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    /// Opens the storage root, creating the directory if it does not exist.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let root = root.into();

        if let Err(err) = tokio::fs::create_dir_all(&root).await {
            log::error!(target: "file_driver", method = "new", root:?, err:err; "Failed to create storage root.");
            return Err(err);
        }

        Ok(Self { root })
    }

    fn blob_path(&self, handle: &str) -> PathBuf {
        self.root.join(handle)
    }
}

#[async_trait]
impl FileDriver for LocalFileSystem {
    async fn store(&self, bytes: &[u8]) -> Result<String, std::io::Error> {
        let handle = Uuid::new_v4().to_string();
        self.store_at(&handle, bytes).await?;
        Ok(handle)
    }

    async fn store_at(&self, handle: &str, bytes: &[u8]) -> Result<(), std::io::Error> {
        let path = self.blob_path(handle);

        if let Err(err) = tokio::fs::write(&path, bytes).await {
            log::error!(target: "file_driver", method = "store_at", path:?, err:err; "Failed to write blob.");
            return Err(err);
        }

        Ok(())
    }

    async fn retrieve(&self, handle: &str) -> Result<Option<Vec<u8>>, std::io::Error> {
        let path = self.blob_path(handle);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                log::error!(target: "file_driver", method = "retrieve", path:?, err:err; "Failed to read blob.");
                Err(err)
            }
        }
    }
}
