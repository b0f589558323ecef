use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Payload of one derived-work job, enqueued once per accepted image upload.
/// Fields are optional because the payload crosses a queue boundary; the
/// worker validates them before doing any work.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailJob {
    pub file_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ThumbnailJob {
    pub fn new(file_id: Uuid, user_id: Uuid) -> Self {
        Self {
            file_id: Some(file_id),
            user_id: Some(user_id),
        }
    }
}

#[derive(Error, Debug)]
pub enum EnqueueError {
    #[error("thumbnail queue is closed")]
    Closed,
}

/// One logical thumbnail-job channel shared by the upload path (producer)
/// and the workers (consumers). Injected into both sides so tests can
/// substitute their own queue.
#[async_trait]
pub trait ThumbnailQueue {
    /// Adds a job to the queue. Fire-and-forget from the request path: the
    /// HTTP response never waits for thumbnail completion.
    async fn enqueue(&self, job: ThumbnailJob) -> Result<(), EnqueueError>;

    /// Waits for the next job. Returns `None` once the queue is closed and
    /// drained; workers use that to stop.
    async fn dequeue(&self) -> Option<ThumbnailJob>;
}

/// Channel-backed queue for a single-node deployment. Consumers share one
/// receiver, so each job is delivered to exactly one worker.
pub struct InMemoryThumbnailQueue {
    sender: mpsc::UnboundedSender<ThumbnailJob>,
    receiver: Mutex<mpsc::UnboundedReceiver<ThumbnailJob>>,
}

impl InMemoryThumbnailQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }
}

impl Default for InMemoryThumbnailQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThumbnailQueue for InMemoryThumbnailQueue {
    async fn enqueue(&self, job: ThumbnailJob) -> Result<(), EnqueueError> {
        self.sender.send(job).map_err(|_| EnqueueError::Closed)
    }

    async fn dequeue(&self) -> Option<ThumbnailJob> {
        self.receiver.lock().await.recv().await
    }
}
