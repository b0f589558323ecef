use super::dto::{CreatingUser, UserRepr};
use crate::{
    dto::{Error, JsonRes},
    guards::AuthUserSession,
    services::{UserService, UserServiceError},
};
use rocket::{get, http::Status, post, routes, serde::json::Json, Build, Rocket, State};
use std::sync::Arc;

pub fn register_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/users", routes![create_user, get_me])
}

#[post("/", data = "<body>")]
async fn create_user(
    user_service: &State<Arc<UserService>>,
    body: Json<CreatingUser<'_>>,
) -> JsonRes<UserRepr> {
    let email = match body.email.filter(|email| !email.is_empty()) {
        Some(email) => email,
        None => {
            return Err(Error::new_static(Status::BadRequest, "Missing email"));
        }
    };
    let password = match body.password.filter(|password| !password.is_empty()) {
        Some(password) => password,
        None => {
            return Err(Error::new_static(Status::BadRequest, "Missing password"));
        }
    };

    let user = match user_service.create_user(email, password).await {
        Ok(user) => user,
        Err(UserServiceError::EmailTaken) => {
            return Err(Error::new_static(Status::BadRequest, "Already exist"));
        }
        Err(err) => {
            log::error!(target: "routes::user::controllers", controller = "create_user", service = "UserService", err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    Ok((Status::Created, Json(UserRepr::from(&user))))
}

#[get("/me")]
async fn get_me(sess: AuthUserSession<'_>) -> JsonRes<UserRepr> {
    Ok((Status::Ok, Json(UserRepr::from(&sess.user))))
}
