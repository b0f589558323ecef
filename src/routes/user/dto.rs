use crate::stores::models::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
pub struct CreatingUser<'a> {
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Public view of a user record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserRepr {
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for UserRepr {
    fn from(user: &User) -> Self {
        UserRepr {
            id: user.id,
            email: user.email.clone(),
        }
    }
}
