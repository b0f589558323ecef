use super::{password_service, PasswordService};
use crate::stores::{
    models::{File, User},
    DocumentStore, DocumentStoreError, SessionStore, SessionStoreError,
};
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthServiceError {
    #[error("session store error: {0}")]
    SessionStore(#[from] SessionStoreError),
    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
    #[error("{0}")]
    PasswordService(#[from] password_service::PasswordServiceError),
}

/// Resolves tokens to users and answers ownership/visibility questions.
/// Authorization checks are pure lookups and compares; nothing here mutates
/// catalog state.
pub struct AuthService {
    session_store: Arc<dyn SessionStore + Send + Sync>,
    document_store: Arc<dyn DocumentStore + Send + Sync>,
    password_service: Arc<PasswordService>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        session_store: Arc<dyn SessionStore + Send + Sync>,
        document_store: Arc<dyn DocumentStore + Send + Sync>,
        password_service: Arc<PasswordService>,
        session_ttl: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            session_store,
            document_store,
            password_service,
            session_ttl,
        })
    }

    /// Authenticates a user by their email and password.
    /// Returns the user ID if the authentication is successful, otherwise None.
    pub async fn authenticate_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Uuid>, AuthServiceError> {
        let user = self.document_store.user_by_email(email).await?;

        let user = match user {
            Some(user) => user,
            None => {
                // prevent timing attacks by hashing a fake password
                self.password_service.hash_password(password)?;
                return Ok(None);
            }
        };

        if !self
            .password_service
            .verify_password_hash(password, &user.password_hash)?
        {
            return Ok(None);
        }

        Ok(Some(user.id))
    }

    /// Creates a new session for the given user ID and returns its token.
    pub async fn create_session(&self, user_id: Uuid) -> Result<String, AuthServiceError> {
        let token = self.password_service.generate_session_token();

        self.session_store
            .put(&token, user_id, self.session_ttl)
            .await?;

        Ok(token)
    }

    /// Removes a session. Returns the user ID it belonged to, or `None` if
    /// the token was unknown or already expired.
    pub async fn remove_session(&self, token: &str) -> Result<Option<Uuid>, AuthServiceError> {
        let user_id = self.session_store.delete(token).await?;
        Ok(user_id)
    }

    /// Resolves a session token to the user it belongs to.
    /// Returns `None` for absent, unknown or expired tokens, and for
    /// sessions whose user no longer resolves in the document store.
    pub async fn get_user_from_session(
        &self,
        token: &str,
    ) -> Result<Option<User>, AuthServiceError> {
        let user_id = match self.session_store.get(token).await? {
            Some(user_id) => user_id,
            None => return Ok(None),
        };

        let user = self.document_store.user_by_id(user_id).await?;
        Ok(user)
    }

    /// Succeeds iff `user_id` owns the file.
    pub fn authorize_owner(&self, user_id: Uuid, file: &File) -> bool {
        file.owner_id == user_id
    }

    /// Succeeds if the file is public, or the requester owns it. Callers
    /// must report a failure as *not found* rather than *forbidden*, so a
    /// private file is indistinguishable from a missing one.
    pub fn authorize_read(&self, requester_id: Option<Uuid>, file: &File) -> bool {
        file.is_public || requester_id == Some(file.owner_id)
    }
}
