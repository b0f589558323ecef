use super::dto::TokenRepr;
use crate::{
    dto::{Error, JsonRes},
    guards::{parse_basic_credentials, AuthUserSession, AuthorizationHeader},
    services::AuthService,
};
use rocket::{get, http::Status, routes, serde::json::Json, Build, Rocket, State};
use std::sync::Arc;

pub fn register_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![connect, disconnect])
}

#[get("/connect")]
async fn connect(
    authorization: AuthorizationHeader<'_>,
    auth_service: &State<Arc<AuthService>>,
) -> JsonRes<TokenRepr> {
    let authorization = match authorization.0 {
        Some(authorization) => authorization,
        None => {
            return Err(Error::new_static(
                Status::InternalServerError,
                "no authorization header",
            ));
        }
    };

    let (email, password) = match parse_basic_credentials(authorization) {
        Some(credentials) => credentials,
        None => {
            return Err(Status::Unauthorized.into());
        }
    };

    let user_id = match auth_service.authenticate_user(&email, &password).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            return Err(Status::Unauthorized.into());
        }
        Err(err) => {
            log::error!(target: "routes::user_session::controllers", controller = "connect", service = "AuthService", err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    let token = match auth_service.create_session(user_id).await {
        Ok(token) => token,
        Err(err) => {
            log::error!(target: "routes::user_session::controllers", controller = "connect", service = "AuthService", err:err; "Error returned from service.");
            return Err(Status::InternalServerError.into());
        }
    };

    Ok((Status::Ok, Json(TokenRepr { token })))
}

#[get("/disconnect")]
async fn disconnect(
    sess: AuthUserSession<'_>,
    auth_service: &State<Arc<AuthService>>,
) -> Result<Status, Error> {
    if let Err(err) = auth_service.remove_session(sess.token).await {
        log::error!(target: "routes::user_session::controllers", controller = "disconnect", service = "AuthService", err:err; "Error returned from service.");
        return Err(Status::InternalServerError.into());
    }

    Ok(Status::NoContent)
}
