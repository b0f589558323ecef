use rocket::{http::Status, serde::json::Json, Responder};
use serde::Serialize;

#[derive(Responder, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ErrorBodyKind {
    Static(&'static str),
    Dynamic(String),
}

#[derive(Responder, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[response(content_type = "json")]
pub struct ErrorBody {
    pub error: ErrorBodyKind,
}

#[derive(Responder, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Error((Status, Json<ErrorBody>));

impl Error {
    pub fn new_static(status: Status, message: &'static str) -> Self {
        Error((
            status,
            Json(ErrorBody {
                error: ErrorBodyKind::Static(message),
            }),
        ))
    }

    pub fn new_dynamic(status: Status, message: impl Into<String>) -> Self {
        Error((
            status,
            Json(ErrorBody {
                error: ErrorBodyKind::Dynamic(message.into()),
            }),
        ))
    }

    pub fn status(&self) -> Status {
        self.0 .0
    }
}

impl From<Status> for Error {
    fn from(value: Status) -> Self {
        let message = match value.code {
            400 => "Bad request",
            401 => "Unauthorized",
            404 => "Not found",
            500 => "Internal server error",
            _ => "Unknown",
        };

        Self::new_static(value, message)
    }
}

pub type JsonRes<T> = Result<(Status, Json<T>), Error>;
