use super::dto::{CreatingFile, FileContent, ListQuery, ParentRef};
use crate::{
    dto::{Error, JsonRes},
    guards::AuthUserSession,
    services::{CreateFileError, FileService, GetContentError},
    stores::models::{File, FileKind},
};
use base64::{prelude::BASE64_STANDARD, Engine};
use rocket::{
    get,
    http::{ContentType, Status, StatusClass},
    post, put, routes,
    serde::json::Json,
    Build, Rocket, State,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn register_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount(
        "/files",
        routes![
            create_file,
            get_file,
            list_files,
            publish_file,
            unpublish_file,
            get_file_data
        ],
    )
}

fn map_create_file_err(err: &CreateFileError) -> Error {
    match err {
        CreateFileError::MissingName => Error::new_static(Status::BadRequest, "Missing name"),
        CreateFileError::MissingData => Error::new_static(Status::BadRequest, "Missing data"),
        CreateFileError::ParentNotFound => {
            Error::new_static(Status::BadRequest, "Parent not found")
        }
        CreateFileError::ParentNotFolder => {
            Error::new_static(Status::BadRequest, "Parent is not a folder")
        }
        _ => Status::InternalServerError.into(),
    }
}

#[post("/", data = "<body>")]
async fn create_file(
    sess: AuthUserSession<'_>,
    file_service: &State<Arc<FileService>>,
    body: Json<CreatingFile>,
) -> JsonRes<File> {
    let body = body.into_inner();

    let name = match body.name.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => name,
        None => {
            return Err(Error::new_static(Status::BadRequest, "Missing name"));
        }
    };
    let kind = match body.kind.as_deref().and_then(|kind| kind.parse::<FileKind>().ok()) {
        Some(kind) => kind,
        None => {
            return Err(Error::new_static(Status::BadRequest, "Missing type"));
        }
    };

    // decode before the parent lookup so an unusable payload fails first,
    // matching the field order of the validation errors
    let data = match kind {
        FileKind::Folder => None,
        FileKind::File | FileKind::Image => {
            let data = body.data.as_deref().filter(|data| !data.is_empty());
            let data = match data {
                Some(data) => data,
                None => {
                    return Err(Error::new_static(Status::BadRequest, "Missing data"));
                }
            };

            match BASE64_STANDARD.decode(data) {
                Ok(bytes) => Some(bytes),
                Err(_) => {
                    return Err(Error::new_static(Status::BadRequest, "Missing data"));
                }
            }
        }
    };

    let parent_id = match body.parent_id {
        ParentRef::Root => None,
        ParentRef::Id(id) => Some(id),
        ParentRef::Invalid => {
            return Err(Error::new_static(Status::BadRequest, "Parent not found"));
        }
    };

    let file = match data {
        None => {
            file_service
                .create_folder(sess.user.id, name, parent_id, body.is_public)
                .await
        }
        Some(bytes) => {
            file_service
                .create_content(sess.user.id, name, kind, parent_id, &bytes, body.is_public)
                .await
        }
    };

    let file = match file {
        Ok(file) => file,
        Err(err) => {
            let error = map_create_file_err(&err);

            if error.status().class() == StatusClass::ServerError {
                log::error!(target: "routes::file::controllers", controller = "create_file", service = "FileService", err:err; "Error returned from service.");
            }

            return Err(error);
        }
    };

    Ok((Status::Created, Json(file)))
}

#[get("/<file_id>")]
async fn get_file(
    sess: AuthUserSession<'_>,
    file_service: &State<Arc<FileService>>,
    file_id: Uuid,
) -> JsonRes<File> {
    let file = file_service.get_file(sess.user.id, file_id).await;

    let file = match file {
        Ok(Some(file)) => file,
        Ok(None) => {
            return Err(Status::NotFound.into());
        }
        Err(err) => {
            log::error!(target: "routes::file::controllers", controller = "get_file", service = "FileService", file_id:serde, err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    Ok((Status::Ok, Json(file)))
}

#[get("/?<query..>")]
async fn list_files(
    sess: AuthUserSession<'_>,
    file_service: &State<Arc<FileService>>,
    query: ListQuery<'_>,
) -> JsonRes<Vec<File>> {
    let parent_id = match query.parent_id {
        None | Some("0") => None,
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            // an unparseable parent matches nothing
            Err(_) => {
                return Ok((Status::Ok, Json(Vec::new())));
            }
        },
    };
    let page = query.page.unwrap_or(0);

    let files = match file_service.list_files(sess.user.id, parent_id, page).await {
        Ok(files) => files,
        Err(err) => {
            log::error!(target: "routes::file::controllers", controller = "list_files", service = "FileService", err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    Ok((Status::Ok, Json(files)))
}

async fn set_file_visibility(
    sess: AuthUserSession<'_>,
    file_service: &FileService,
    file_id: Uuid,
    is_public: bool,
) -> JsonRes<File> {
    let file = file_service
        .set_visibility(sess.user.id, file_id, is_public)
        .await;

    let file = match file {
        Ok(Some(file)) => file,
        Ok(None) => {
            return Err(Status::NotFound.into());
        }
        Err(err) => {
            log::error!(target: "routes::file::controllers", controller = "set_file_visibility", service = "FileService", file_id:serde, is_public, err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    Ok((Status::Ok, Json(file)))
}

#[put("/<file_id>/publish")]
async fn publish_file(
    sess: AuthUserSession<'_>,
    file_service: &State<Arc<FileService>>,
    file_id: Uuid,
) -> JsonRes<File> {
    set_file_visibility(sess, file_service, file_id, true).await
}

#[put("/<file_id>/unpublish")]
async fn unpublish_file(
    sess: AuthUserSession<'_>,
    file_service: &State<Arc<FileService>>,
    file_id: Uuid,
) -> JsonRes<File> {
    set_file_visibility(sess, file_service, file_id, false).await
}

#[get("/<file_id>/data")]
async fn get_file_data(
    sess: Option<AuthUserSession<'_>>,
    file_service: &State<Arc<FileService>>,
    file_id: Uuid,
) -> Result<FileContent, Error> {
    let requester_id = sess.map(|sess| sess.user.id);

    let content = file_service.get_file_content(requester_id, file_id).await;

    let (file, bytes) = match content {
        Ok(Some(content)) => content,
        Ok(None) => {
            return Err(Status::NotFound.into());
        }
        Err(GetContentError::FolderHasNoContent) => {
            return Err(Error::new_static(
                Status::BadRequest,
                "A folder doesn't have content",
            ));
        }
        Err(err) => {
            log::error!(target: "routes::file::controllers", controller = "get_file_data", service = "FileService", file_id:serde, err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    let mime = mime_guess::from_path(&file.name).first_or_octet_stream();
    let content_type =
        ContentType::parse_flexible(mime.essence_str()).unwrap_or(ContentType::Binary);

    Ok(FileContent {
        content_type,
        bytes,
    })
}
