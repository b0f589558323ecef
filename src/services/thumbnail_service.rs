use super::{file_driver::rendition_handle, FileDriver, ThumbnailJob};
use crate::stores::{DocumentStore, DocumentStoreError};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::{io::Cursor, sync::Arc};
use thiserror::Error;

/// Rendition pixel widths, attempted in this order.
pub const RENDITION_WIDTHS: [u32; 3] = [500, 250, 100];

#[derive(Error, Debug)]
pub enum ThumbnailJobError {
    #[error("Missing fileId")]
    MissingFileId,
    #[error("Missing userId")]
    MissingUserId,
    #[error("File not found")]
    FileNotFound,
    #[error("source blob is gone: {handle}")]
    SourceMissing { handle: String },
    #[error("failed to decode source image: {0}")]
    Decode(image::ImageError),
    #[error("failed to render {width}px rendition: {source}")]
    Render {
        width: u32,
        source: image::ImageError,
    },
    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThumbnailJobError {
    /// A non-retriable job carries a defect no redelivery can repair: the
    /// payload is incomplete or the referenced file is gone. Everything else
    /// may succeed on a later attempt.
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            ThumbnailJobError::MissingFileId
                | ThumbnailJobError::MissingUserId
                | ThumbnailJobError::FileNotFound
        )
    }
}

/// Consumes thumbnail jobs: resolves the uploaded image and writes one
/// resized rendition per configured width next to the original blob.
pub struct ThumbnailService {
    document_store: Arc<dyn DocumentStore + Send + Sync>,
    file_driver: Arc<dyn FileDriver + Send + Sync>,
}

impl ThumbnailService {
    pub fn new(
        document_store: Arc<dyn DocumentStore + Send + Sync>,
        file_driver: Arc<dyn FileDriver + Send + Sync>,
    ) -> Arc<Self> {
        Arc::new(Self {
            document_store,
            file_driver,
        })
    }

    /// Processes one job to completion. Renditions are generated
    /// sequentially, width by width; the first failure aborts the remaining
    /// widths and fails the job. Widths already written stay on disk, and
    /// re-processing overwrites them in place, so redelivered jobs are safe.
    pub async fn process_job(&self, job: &ThumbnailJob) -> Result<(), ThumbnailJobError> {
        let file_id = job.file_id.ok_or(ThumbnailJobError::MissingFileId)?;
        let user_id = job.user_id.ok_or(ThumbnailJobError::MissingUserId)?;

        let file = self
            .document_store
            .file_by_id(file_id)
            .await?
            .filter(|file| file.owner_id == user_id)
            .ok_or(ThumbnailJobError::FileNotFound)?;
        let handle = file.local_path.ok_or(ThumbnailJobError::FileNotFound)?;

        let bytes = self
            .file_driver
            .retrieve(&handle)
            .await?
            .ok_or_else(|| ThumbnailJobError::SourceMissing {
                handle: handle.clone(),
            })?;

        let format = image::guess_format(&bytes).unwrap_or(ImageFormat::Png);
        let source = image::load_from_memory(&bytes).map_err(ThumbnailJobError::Decode)?;

        for width in RENDITION_WIDTHS {
            let rendition = render(&source, format, width)
                .map_err(|source| ThumbnailJobError::Render { width, source })?;

            self.file_driver
                .store_at(&rendition_handle(&handle, width), &rendition)
                .await?;

            log::debug!(target: "thumbnail_service", file_id:serde = file_id, width; "Rendition written.");
        }

        Ok(())
    }
}

/// Resizes `source` to the target pixel width, preserving the aspect ratio,
/// and re-encodes it in the source format.
fn render(
    source: &DynamicImage,
    format: ImageFormat,
    width: u32,
) -> Result<Vec<u8>, image::ImageError> {
    let (source_width, source_height) = (source.width().max(1), source.height().max(1));
    // ceiling, so the width bound is the one that binds and comes out exact
    let height = ((source_height as u64 * width as u64 + source_width as u64 - 1)
        / source_width as u64)
        .max(1) as u32;

    let resized = source.resize(width, height, FilterType::Lanczos3);

    let mut buf = Cursor::new(Vec::new());
    resized.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}
