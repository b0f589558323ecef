use crate::services::{ThumbnailQueue, ThumbnailService};
use parking_lot::Mutex;
use rocket::{
    fairing::{Fairing, Info},
    Orbit, Rocket,
};
use std::sync::Arc;

/// Runs the thumbnail workers for the lifetime of the server. Each worker
/// pulls independent jobs off the shared queue; the widths within a job stay
/// sequential, but there is no ordering across jobs.
pub struct ThumbnailWorker {
    worker_count: usize,
    stop_signal_senders: Mutex<Vec<tokio::sync::oneshot::Sender<()>>>,
    task_join_handles: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl ThumbnailWorker {
    pub fn new(worker_count: usize) -> Self {
        ThumbnailWorker {
            worker_count: worker_count.max(1),
            stop_signal_senders: Mutex::new(Vec::new()),
            task_join_handles: Mutex::new(Vec::new()),
        }
    }
}

#[rocket::async_trait]
impl Fairing for ThumbnailWorker {
    fn info(&self) -> Info {
        Info {
            name: "Thumbnail Worker",
            kind: rocket::fairing::Kind::Liftoff | rocket::fairing::Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let worker_count = self.worker_count;

        log::info!(target: "thumbnail_worker", worker_count; "Starting thumbnail workers.");

        let thumbnail_queue = rocket
            .state::<Arc<dyn ThumbnailQueue + Send + Sync>>()
            .unwrap()
            .clone();
        let thumbnail_service = rocket.state::<Arc<ThumbnailService>>().unwrap().clone();

        let mut stop_signal_senders = Vec::with_capacity(worker_count);
        let mut task_join_handles = Vec::with_capacity(worker_count);

        for worker in 0..worker_count {
            let (stop_signal_sender, stop_signal_receiver) = tokio::sync::oneshot::channel();

            task_join_handles.push(tokio::spawn(process_jobs_task(
                worker,
                stop_signal_receiver,
                thumbnail_queue.clone(),
                thumbnail_service.clone(),
            )));
            stop_signal_senders.push(stop_signal_sender);
        }

        let mut stop_signal_senders_lock = self.stop_signal_senders.lock();
        *stop_signal_senders_lock = stop_signal_senders;
        drop(stop_signal_senders_lock);

        let mut task_join_handles_lock = self.task_join_handles.lock();
        *task_join_handles_lock = task_join_handles;
        drop(task_join_handles_lock);

        log::info!(target: "thumbnail_worker", worker_count; "Thumbnail workers started.");
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        log::info!(target: "thumbnail_worker", "Shutting down thumbnail workers.");

        let task_join_handles = {
            let mut stop_signal_senders_lock = self.stop_signal_senders.lock();
            let stop_signal_senders = std::mem::take(&mut *stop_signal_senders_lock);
            drop(stop_signal_senders_lock);

            for stop_signal_sender in stop_signal_senders {
                stop_signal_sender.send(()).ok();
            }

            let mut task_join_handles_lock = self.task_join_handles.lock();
            std::mem::take(&mut *task_join_handles_lock)
        };

        for task_join_handle in task_join_handles {
            task_join_handle.await.ok();
        }

        log::info!(target: "thumbnail_worker", "Thumbnail workers shut down.");
    }
}

async fn process_jobs_task(
    worker: usize,
    mut stop_signal_receiver: tokio::sync::oneshot::Receiver<()>,
    thumbnail_queue: Arc<dyn ThumbnailQueue + Send + Sync>,
    thumbnail_service: Arc<ThumbnailService>,
) {
    loop {
        tokio::select! {
            job = thumbnail_queue.dequeue() => {
                let job = match job {
                    Some(job) => job,
                    None => {
                        log::info!(target: "thumbnail_worker", worker; "Queue closed; worker stopping.");
                        break;
                    }
                };

                log::info!(target: "thumbnail_worker", worker, job:serde; "Processing thumbnail job.");

                match thumbnail_service.process_job(&job).await {
                    Ok(()) => {
                        log::info!(target: "thumbnail_worker", worker, job:serde; "Thumbnail job completed.");
                    }
                    Err(err) if !err.is_retriable() => {
                        // the job can never succeed; drop it
                        log::warn!(target: "thumbnail_worker", worker, job:serde, err:err; "Discarding dead thumbnail job.");
                    }
                    Err(err) => {
                        log::error!(target: "thumbnail_worker", worker, job:serde, err:err; "Thumbnail job failed.");
                    }
                }
            }
            _ = &mut stop_signal_receiver => {
                break;
            }
        }
    }
}
