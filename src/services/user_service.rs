use super::{password_service, PasswordService};
use crate::stores::{models::User, DocumentStore, DocumentStoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum UserServiceError {
    #[error("a user with this email already exists")]
    EmailTaken,
    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
    #[error("{0}")]
    PasswordService(#[from] password_service::PasswordServiceError),
}

pub struct UserService {
    document_store: Arc<dyn DocumentStore + Send + Sync>,
    password_service: Arc<PasswordService>,
}

impl UserService {
    pub fn new(
        document_store: Arc<dyn DocumentStore + Send + Sync>,
        password_service: Arc<PasswordService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            document_store,
            password_service,
        })
    }

    /// Registers a new user. The password is hashed before it is stored.
    ///
    /// Email uniqueness is a read-then-insert sequence; it is not race-free
    /// under truly concurrent registrations. A store backend with a unique
    /// index is the real guard.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        if self.document_store.user_by_email(email).await?.is_some() {
            return Err(UserServiceError::EmailTaken);
        }

        let password_hash = self.password_service.hash_password(password)?;
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            joined_at: Utc::now(),
        };

        self.document_store.insert_user(user.clone()).await?;

        Ok(user)
    }

    /// Retrieves a user by their ID.
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, UserServiceError> {
        let user = self.document_store.user_by_id(user_id).await?;
        Ok(user)
    }

    pub async fn count_users(&self) -> Result<u64, UserServiceError> {
        let count = self.document_store.count_users().await?;
        Ok(count)
    }
}
