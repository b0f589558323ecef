use crate::{dto::Error, services::AuthService, stores::models::User};
use base64::{prelude::BASE64_STANDARD, Engine};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
    State,
};
use serde::Serialize;
use std::sync::Arc;

/// A request authenticated through the `x-token` header.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AuthUserSession<'a> {
    pub user: User,
    pub token: &'a str,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUserSession<'r> {
    type Error = Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match request.headers().get_one("x-token") {
            Some(token) => token,
            None => return Outcome::Error((Status::Unauthorized, Status::Unauthorized.into())),
        };

        let auth_service = match request.guard::<&State<Arc<AuthService>>>().await {
            Outcome::Success(auth_service) => auth_service,
            Outcome::Error(_) => {
                log::error!(target: "guards::AuthUserSession", guard = "AuthUserSession"; "Failed to get AuthService from request guard.");
                return Outcome::Error((
                    Status::InternalServerError,
                    Status::InternalServerError.into(),
                ));
            }
            Outcome::Forward(status) => {
                return Outcome::Forward(status);
            }
        };

        let user = match auth_service.get_user_from_session(token).await {
            Ok(Some(user)) => user,
            Ok(None) => return Outcome::Error((Status::Unauthorized, Status::Unauthorized.into())),
            Err(err) => {
                log::error!(target: "guards::AuthUserSession", guard = "AuthUserSession", service = "AuthService", err:err; "Failed to get user from session.");
                return Outcome::Error((
                    Status::InternalServerError,
                    Status::InternalServerError.into(),
                ));
            }
        };

        Outcome::Success(AuthUserSession { user, token })
    }
}

/// The raw `Authorization` header, surfaced as-is so the login controller
/// can tell a missing header apart from bad credentials.
pub struct AuthorizationHeader<'r>(pub Option<&'r str>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthorizationHeader<'r> {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(AuthorizationHeader(
            request.headers().get_one("Authorization"),
        ))
    }
}

/// Parses a `Basic` authorization header into `(email, password)`.
pub fn parse_basic_credentials(authorization: &str) -> Option<(String, String)> {
    let segments = authorization.trim().splitn(2, ' ').collect::<Vec<&str>>();

    if segments.len() != 2 || !segments[0].eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = BASE64_STANDARD.decode(segments[1].trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;

    Some((email.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_basic_credentials() {
        let header = format!("Basic {}", BASE64_STANDARD.encode("a@x.com:p"));

        assert_eq!(
            parse_basic_credentials(&header),
            Some(("a@x.com".to_string(), "p".to_string()))
        );
    }

    #[test]
    fn passwords_may_contain_colons() {
        let header = format!("Basic {}", BASE64_STANDARD.encode("a@x.com:p:q"));

        assert_eq!(
            parse_basic_credentials(&header),
            Some(("a@x.com".to_string(), "p:q".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(parse_basic_credentials("Basic"), None);
        assert_eq!(parse_basic_credentials("Bearer abc"), None);
        assert_eq!(parse_basic_credentials("Basic not-base64!"), None);
        assert_eq!(
            parse_basic_credentials(&format!("Basic {}", BASE64_STANDARD.encode("no-colon"))),
            None
        );
    }
}
