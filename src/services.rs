mod auth_service;
mod file_driver;
mod file_service;
mod password_service;
mod thumbnail_queue;
mod thumbnail_service;
mod user_service;

pub use auth_service::*;
pub use file_driver::*;
pub use file_service::*;
pub use password_service::*;
pub use thumbnail_queue::*;
pub use thumbnail_service::*;
pub use user_service::*;

use crate::stores::{DocumentStore, SessionStore};
use chrono::Duration;
use rocket::{Build, Rocket};
use std::sync::Arc;

pub fn register_services(
    rocket: Rocket<Build>,
    session_store: Arc<dyn SessionStore + Send + Sync>,
    document_store: Arc<dyn DocumentStore + Send + Sync>,
    file_driver: Arc<dyn FileDriver + Send + Sync>,
    thumbnail_queue: Arc<dyn ThumbnailQueue + Send + Sync>,
    session_ttl: Duration,
) -> Rocket<Build> {
    let password_service = PasswordService::new();
    let auth_service = AuthService::new(
        session_store.clone(),
        document_store.clone(),
        password_service.clone(),
        session_ttl,
    );
    let user_service = UserService::new(document_store.clone(), password_service.clone());
    let file_service = FileService::new(
        document_store.clone(),
        file_driver.clone(),
        thumbnail_queue.clone(),
        auth_service.clone(),
    );
    let thumbnail_service = ThumbnailService::new(document_store.clone(), file_driver);

    rocket
        .manage(session_store)
        .manage(document_store)
        .manage(thumbnail_queue)
        .manage(password_service)
        .manage(auth_service)
        .manage(user_service)
        .manage(file_service)
        .manage(thumbnail_service)
}
