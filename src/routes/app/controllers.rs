use super::dto::{ServiceStats, ServiceStatus};
use crate::{
    dto::JsonRes,
    services::{FileService, UserService},
    stores::{DocumentStore, SessionStore},
};
use rocket::{get, http::Status, routes, serde::json::Json, Build, Rocket, State};
use std::sync::Arc;

pub fn register_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![get_status, get_stats])
}

#[get("/status")]
async fn get_status(
    session_store: &State<Arc<dyn SessionStore + Send + Sync>>,
    document_store: &State<Arc<dyn DocumentStore + Send + Sync>>,
) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        redis: session_store.is_alive().await,
        db: document_store.is_alive().await,
    })
}

#[get("/stats")]
async fn get_stats(
    user_service: &State<Arc<UserService>>,
    file_service: &State<Arc<FileService>>,
) -> JsonRes<ServiceStats> {
    let users = match user_service.count_users().await {
        Ok(users) => users,
        Err(err) => {
            log::error!(target: "routes::app::controllers", controller = "get_stats", service = "UserService", err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    let files = match file_service.count_files().await {
        Ok(files) => files,
        Err(err) => {
            log::error!(target: "routes::app::controllers", controller = "get_stats", service = "FileService", err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    Ok((Status::Ok, Json(ServiceStats { users, files })))
}
