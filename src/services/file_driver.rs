pub mod local_file_system;

use async_trait::async_trait;

/// Builds the handle of a resized rendition derived from `handle`.
pub fn rendition_handle(handle: &str, width: u32) -> String {
    format!("{}_{}", handle, width)
}

/// Raw byte storage behind the catalog. Handles are opaque to callers; the
/// catalog persists them verbatim and hands them back for retrieval.
///
/// A fresh handle is written exactly once and never mutated, so concurrent
/// readers are safe without locking. Rendition writes go through
/// [`FileDriver::store_at`] and must tolerate overwrites, since a redelivered
/// job may re-attempt widths that were already written.
#[async_trait]
pub trait FileDriver {
    /// Writes `bytes` under a freshly allocated, collision-resistant handle
    /// and returns the handle.
    async fn store(&self, bytes: &[u8]) -> Result<String, std::io::Error>;

    /// Writes `bytes` at an exact handle, replacing any previous content.
    async fn store_at(&self, handle: &str, bytes: &[u8]) -> Result<(), std::io::Error>;

    /// Reads the content behind `handle`. Returns `None` if the handle does
    /// not resolve, whether never written or removed out-of-band.
    async fn retrieve(&self, handle: &str) -> Result<Option<Vec<u8>>, std::io::Error>;
}
